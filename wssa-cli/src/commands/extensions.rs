//! `wssa extensions`: list the layers of a data release.

use clap::Args;
use serde_json::Value;
use wssa::config::ConfigFile;
use wssa::release::{ExtensionKind, ReleaseParams};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ExtensionsArgs {
    /// Print a JSON array instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Run the extensions command.
pub fn run(args: ExtensionsArgs, config: &ConfigFile) -> Result<(), CliError> {
    let release = config.release_params()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extensions_json(&release)?)?);
        return Ok(());
    }

    println!("Release {} ({} tiles)", release.id, release.tile_count);
    println!();
    println!("{:>3}  {:<6} {:<12} {}", "#", "NAME", "KIND", "DESCRIPTION");
    for ext in release.extensions() {
        let note = match ext.kind {
            ExtensionKind::Continuous => "",
            ExtensionKind::Categorical => " (not calibrated)",
        };
        println!(
            "{:>3}  {:<6} {:<12} {}{}",
            ext.index,
            ext.name,
            ext.kind.to_string(),
            ext.description,
            note
        );
    }

    Ok(())
}

fn extensions_json(release: &ReleaseParams) -> Result<Value, CliError> {
    Ok(serde_json::to_value(release.extensions())?)
}
