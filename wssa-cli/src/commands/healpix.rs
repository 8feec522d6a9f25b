//! `wssa healpix`: ring-scheme pixel conversions.

use clap::Subcommand;
use wssa::healpix::RingPixelizer;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum HealpixCommands {
    /// Ring pixel index for each (theta, phi)
    Ang2pix {
        #[arg(long)]
        nside: u32,

        /// Colatitude(s), radians unless --degrees
        #[arg(long, num_args = 1.., value_delimiter = ',', allow_negative_numbers = true)]
        theta: Vec<f64>,

        /// Longitude(s), radians unless --degrees
        #[arg(long, num_args = 1.., value_delimiter = ',', allow_negative_numbers = true)]
        phi: Vec<f64>,

        /// Angles are in degrees
        #[arg(long)]
        degrees: bool,
    },

    /// Pixel center (theta, phi) for each ring pixel index
    Pix2ang {
        #[arg(long)]
        nside: u32,

        #[arg(long, num_args = 1.., value_delimiter = ',')]
        pix: Vec<u64>,

        /// Print angles in degrees
        #[arg(long)]
        degrees: bool,
    },
}

/// Run a healpix subcommand.
pub fn run(command: HealpixCommands) -> Result<(), CliError> {
    let lines = match command {
        HealpixCommands::Ang2pix {
            nside,
            theta,
            phi,
            degrees,
        } => ang2pix(nside, &theta, &phi, degrees)?,
        HealpixCommands::Pix2ang {
            nside,
            pix,
            degrees,
        } => pix2ang(nside, &pix, degrees)?,
    };

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn ang2pix(nside: u32, theta: &[f64], phi: &[f64], degrees: bool) -> Result<Vec<String>, CliError> {
    if theta.len() != phi.len() {
        return Err(CliError::Input(format!(
            "{} theta values but {} phi values",
            theta.len(),
            phi.len()
        )));
    }

    let pixelizer = RingPixelizer::new(nside)?;
    let scale = if degrees { 1f64.to_radians() } else { 1.0 };

    Ok(theta
        .iter()
        .zip(phi)
        .map(|(&t, &p)| pixelizer.angle_to_index(t * scale, p * scale).to_string())
        .collect())
}

fn pix2ang(nside: u32, pix: &[u64], degrees: bool) -> Result<Vec<String>, CliError> {
    let pixelizer = RingPixelizer::new(nside)?;

    pix.iter()
        .map(|&p| {
            let (theta, phi) = pixelizer.index_to_angle(p)?;
            Ok(if degrees {
                format!("{} {}", theta.to_degrees(), phi.to_degrees())
            } else {
                format!("{} {}", theta, phi)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ang2pix_north_pole_and_degrees() {
        assert_eq!(ang2pix(1, &[0.0], &[0.0], false).unwrap(), vec!["0"]);
        let radians = ang2pix(16, &[1.0], &[2.0], false).unwrap();
        let degrees = ang2pix(16, &[1f64.to_degrees()], &[2f64.to_degrees()], true).unwrap();
        assert_eq!(radians, degrees);
    }

    #[test]
    fn test_pix2ang_first_pixel() {
        let lines = pix2ang(1, &[0], true).unwrap();
        let fields: Vec<f64> = lines[0].split(' ').map(|f| f.parse().unwrap()).collect();
        // first ring at z = 2/3, first pixel at phi = 45 degrees
        assert!((fields[0] - (2.0f64 / 3.0).acos().to_degrees()).abs() < 1e-9);
        assert!((fields[1] - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(ang2pix(0, &[0.0], &[0.0], false), Err(CliError::Healpix(_))));
        assert!(matches!(ang2pix(1, &[0.0, 1.0], &[0.0], false), Err(CliError::Input(_))));
        assert!(matches!(pix2ang(1, &[12], false), Err(CliError::Healpix(_))));
    }
}
