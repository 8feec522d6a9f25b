//! `wssa resolve`: map sky positions to tiles and raster coordinates.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use ndarray::ArrayView1;
use serde_json::json;
use tracing::info;
use wssa::config::ConfigFile;
use wssa::resolver::ResolvedArrays;

use super::common::{create_service, CoordinateArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub coords: CoordinateArgs,

    /// Also write X, Y and TILE images to this FITS file
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print a JSON document instead of text columns
    #[arg(long)]
    pub json: bool,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs, config: &ConfigFile) -> Result<(), CliError> {
    let (ra, dec) = args.coords.read()?;
    let service = create_service(config)?;

    let resolved = service.resolve(
        ArrayView1::from(&ra[..]).into_dyn(),
        ArrayView1::from(&dec[..]).into_dyn(),
    )?;

    if let Some(path) = &args.output {
        write_positions(path, &resolved)?;
        info!(path = %path.display(), positions = ra.len(), "Wrote raster coordinates");
    }

    let mut stdout = std::io::stdout().lock();
    if args.json {
        let document = json!({
            "ra": ra,
            "dec": dec,
            "tile": resolved.tiles.iter().collect::<Vec<_>>(),
            "x": resolved.x.iter().collect::<Vec<_>>(),
            "y": resolved.y.iter().collect::<Vec<_>>(),
        });
        serde_json::to_writer_pretty(&mut stdout, &document)?;
        writeln!(stdout)?;
    } else {
        for i in 0..ra.len() {
            writeln!(
                stdout,
                "{} {} {} {:.4} {:.4}",
                ra[i], dec[i], resolved.tiles[[i]], resolved.x[[i]], resolved.y[[i]]
            )?;
        }
    }

    Ok(())
}

/// Write x as the primary HDU, then y and the tile ids as image
/// extensions, each named by `EXTNAME`. An existing file is replaced.
pub fn write_positions(path: &Path, resolved: &ResolvedArrays) -> Result<(), CliError> {
    let fits_error = |source: fitsio::errors::Error| CliError::Fits {
        path: path.to_path_buf(),
        source,
    };

    // fitsio won't overwrite
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let dimensions = resolved.x.shape();
    let double = ImageDescription {
        data_type: ImageType::Double,
        dimensions,
    };
    let long = ImageDescription {
        data_type: ImageType::Long,
        dimensions,
    };

    let x: Vec<f64> = resolved.x.iter().copied().collect();
    let y: Vec<f64> = resolved.y.iter().copied().collect();
    let tiles: Vec<i32> = resolved.tiles.iter().copied().collect();

    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&double)
        .open()
        .map_err(fits_error)?;

    let hdu = fptr.primary_hdu().map_err(fits_error)?;
    hdu.write_key(&mut fptr, "EXTNAME", "X").map_err(fits_error)?;
    hdu.write_image(&mut fptr, &x).map_err(fits_error)?;

    let hdu = fptr
        .create_image("Y".to_string(), &double)
        .map_err(fits_error)?;
    hdu.write_image(&mut fptr, &y).map_err(fits_error)?;

    let hdu = fptr
        .create_image("TILE".to_string(), &long)
        .map_err(fits_error)?;
    hdu.write_image(&mut fptr, &tiles).map_err(fits_error)?;

    Ok(())
}
