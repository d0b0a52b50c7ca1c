//! Inspect command - ingest a material archive and report what survived.
//!
//! Builds the tile index without starting a scheduler, so the report can
//! include details a job snapshot does not carry (skipped entry counts).

use clap::Args;
use photomosaic::config::IngestLimits;
use photomosaic::material::build_material_index;
use std::fs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::progress::percent_bar;
use crate::error::CliError;

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Zip archive of material images (jpg, jpeg, png, webp)
    #[arg(long)]
    pub materials: PathBuf,
}

/// Run the inspect command.
pub async fn run(args: InspectArgs) -> Result<(), CliError> {
    let archive = fs::read(&args.materials).map_err(|error| CliError::FileRead {
        path: args.materials.display().to_string(),
        error,
    })?;

    let bar = percent_bar("Scanning");
    let progress_bar = bar.clone();
    let cancel = CancellationToken::new();

    let index = tokio::task::spawn_blocking(move || {
        let limits = IngestLimits::default();
        build_material_index(&archive, &limits, &cancel, |progress, _| {
            progress_bar.set_position(u64::from(progress));
        })
    })
    .await
    .map_err(|e| CliError::Ingest(e.to_string()))?
    .map_err(|e| CliError::Ingest(e.to_string()))?;

    bar.finish_with_message("done");

    println!("Archive: {}", args.materials.display());
    println!("  Usable tiles: {}", index.len());
    println!("  Skipped entries: {}", index.skipped());
    Ok(())
}
