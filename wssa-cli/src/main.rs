//! WSSA CLI - command-line interface to the WISE 12 micron all-sky tiles.
//!
//! ```text
//! wssa getval --ra 83.8,84.1 --dec -5.4,-5.6 --exten clean --calibrated
//! wssa resolve --input positions.txt --output xy.fits
//! wssa healpix ang2pix --nside 64 --theta 1.2 --phi 0.4
//! wssa config set tiles.path /data/wssa/tiles
//! ```

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing::debug;
use wssa::config::ConfigFile;

use commands::common::{load_config, GlobalArgs};
use commands::config::ConfigCommands;
use commands::extensions::ExtensionsArgs;
use commands::getval::GetvalArgs;
use commands::healpix::HealpixCommands;
use commands::resolve::ResolveArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "wssa")]
#[command(version = wssa::VERSION)]
#[command(about = "Sample the WISE 12 micron all-sky tiles at celestial coordinates")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample a tile layer at sky positions
    Getval(GetvalArgs),

    /// Map sky positions to tile ids and raster coordinates
    Resolve(ResolveArgs),

    /// List the layers of the configured data release
    Extensions(ExtensionsArgs),

    /// HEALPix ring-scheme conversions
    #[command(subcommand)]
    Healpix(HealpixCommands),

    /// View and modify configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    match cli.command {
        // operates on the file, not the effective configuration
        Commands::Config(command) => commands::config::run(command, &global.config_path()),
        Commands::Healpix(command) => commands::healpix::run(command),
        Commands::Getval(args) => with_config(global, |c| commands::getval::run(args, c)),
        Commands::Resolve(args) => with_config(global, |c| commands::resolve::run(args, c)),
        Commands::Extensions(args) => with_config(global, |c| commands::extensions::run(args, c)),
    }
}

/// Load the effective configuration and start logging before running `f`.
fn with_config(
    global: &GlobalArgs,
    f: impl FnOnce(&ConfigFile) -> Result<(), CliError>,
) -> Result<(), CliError> {
    let config = load_config(global)?;
    let _guard = wssa::logging::init_logging(&config.logging_config())?;
    debug!(path = ?config.path(), "Configuration loaded");
    f(&config)
}
