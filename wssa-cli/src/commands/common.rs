//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::Args;
use wssa::config::ConfigFile;
use wssa::release::{ReleaseParams, TileSize};
use wssa::service::ValueService;

use crate::error::CliError;

/// Flags that override the configuration file for one invocation.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config dir, wssa/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the tile rasters (overrides WISE_TILE)
    #[arg(long, global = true, value_name = "DIR")]
    pub tile_path: Option<PathBuf>,

    /// Directory holding the tile index and pixel lookup tables (overrides WISE_DATA)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use the 3000 x 3000 pixel tiles
    #[arg(long, global = true)]
    pub small: bool,

    /// Tile files are gzip compressed (.fits.gz)
    #[arg(long, global = true)]
    pub gzip: bool,

    /// Data release identifier
    #[arg(long, global = true, value_name = "ID")]
    pub release: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Configuration file this invocation reads.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(wssa::config::config_file_path)
    }

    /// Apply flag overrides. CLI takes precedence over environment, which
    /// takes precedence over the file.
    pub fn apply(&self, config: &mut ConfigFile) -> Result<(), CliError> {
        if let Some(dir) = &self.data_dir {
            config.data.catalog_dir = dir.clone();
        }
        if let Some(dir) = &self.tile_path {
            config.tiles.path = dir.clone();
        }
        if self.small {
            config.tiles.size = TileSize::Small;
        }
        if self.gzip {
            config.tiles.gzip = true;
        }
        if let Some(release) = &self.release {
            config.tiles.release = ReleaseParams::for_release(release)?.id;
        }
        match self.verbose {
            0 => {}
            1 => config.logging.level = "debug".to_string(),
            _ => config.logging.level = "trace".to_string(),
        }
        Ok(())
    }
}

/// Effective configuration: file, then environment, then flags.
pub fn load_config(global: &GlobalArgs) -> Result<ConfigFile, CliError> {
    let mut config = ConfigFile::load_from(global.config_path())?;
    config.apply_env();
    global.apply(&mut config)?;
    Ok(config)
}

/// Build the value service, loading the tile catalog.
pub fn create_service(config: &ConfigFile) -> Result<ValueService, CliError> {
    Ok(ValueService::from_config(config)?)
}

/// Sky positions given on the command line or in a file.
#[derive(Debug, Clone, Default, Args)]
pub struct CoordinateArgs {
    /// Right ascension(s) in degrees
    #[arg(long, num_args = 1.., value_delimiter = ',', allow_negative_numbers = true)]
    pub ra: Vec<f64>,

    /// Declination(s) in degrees
    #[arg(long, num_args = 1.., value_delimiter = ',', allow_negative_numbers = true)]
    pub dec: Vec<f64>,

    /// Read "ra dec" pairs, one per line, from a file ("-" for stdin)
    #[arg(long, short, value_name = "FILE", conflicts_with_all = ["ra", "dec"])]
    pub input: Option<PathBuf>,
}

impl CoordinateArgs {
    /// Collect (ra, dec) lists from flags or the input file.
    pub fn read(&self) -> Result<(Vec<f64>, Vec<f64>), CliError> {
        let (ra, dec) = match &self.input {
            Some(path) => parse_coordinate_text(&read_input(path)?)?,
            None => (self.ra.clone(), self.dec.clone()),
        };

        if ra.is_empty() {
            return Err(CliError::Input(
                "No coordinates given. Use --ra/--dec or --input.".to_string(),
            ));
        }
        if ra.len() != dec.len() {
            return Err(CliError::Input(format!(
                "{} right ascensions but {} declinations",
                ra.len(),
                dec.len()
            )));
        }
        Ok((ra, dec))
    }
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let read = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    };
    read.map_err(|source| CliError::InputFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse whitespace or comma separated "ra dec" lines.
///
/// Blank lines and lines starting with `#` are skipped; columns after
/// the second are ignored.
pub fn parse_coordinate_text(text: &str) -> Result<(Vec<f64>, Vec<f64>), CliError> {
    let mut ra = Vec::new();
    let mut dec = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty());
        let mut next = |what: &str| -> Result<f64, CliError> {
            let field = fields.next().ok_or_else(|| {
                CliError::Input(format!("line {}: missing {}", number + 1, what))
            })?;
            field.parse().map_err(|_| {
                CliError::Input(format!("line {}: invalid {} '{}'", number + 1, what, field))
            })
        };
        ra.push(next("ra")?);
        dec.push(next("dec")?);
    }

    Ok((ra, dec))
}
