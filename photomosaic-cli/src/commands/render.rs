//! Render command - ingest a material archive and render a mosaic.

use clap::Args;
use photomosaic::config::SchedulerConfig;
use photomosaic::engine::MosaicParams;
use photomosaic::jobs::{JobStatus, Scheduler};
use photomosaic::material::MaterialStatus;
use photomosaic::registry::{InMemoryRegistry, ResourceKind, ResourceRegistry, SessionId};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::progress::{percent_bar, track_job, track_material};
use crate::error::CliError;

/// Arguments for the render command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Target photograph to reconstruct
    #[arg(long)]
    pub target: PathBuf,

    /// Zip archive of material images (jpg, jpeg, png, webp)
    #[arg(long)]
    pub materials: PathBuf,

    /// Output JPEG path
    #[arg(long, default_value = "mosaic.jpg")]
    pub output: PathBuf,

    /// Edge length of each mosaic cell in pixels (8-256)
    #[arg(long, default_value_t = 32)]
    pub tile_size: u32,

    /// Minimum number of cells before a tile may repeat (0 disables)
    #[arg(long, default_value_t = 0)]
    pub no_repeat: usize,

    /// Color correction strength, 0 (tile verbatim) to 1 (cell average)
    #[arg(long, default_value_t = 0.3)]
    pub color_strength: f32,

    /// Overlay blend of the original target, 0 (off) to 1 (target only)
    #[arg(long, default_value_t = 0.0)]
    pub overlay_strength: f32,
}

/// Run the render command.
///
/// Inputs flow through a session-scoped resource registry, the same
/// ownership boundary a multi-user front-end would enforce.
pub async fn run(args: RenderArgs) -> Result<(), CliError> {
    let registry = InMemoryRegistry::new();
    let session = SessionId::new("cli");
    let target_id = registry.store(&session, ResourceKind::Target, read_file(&args.target)?);
    let archive_id = registry.store(
        &session,
        ResourceKind::MaterialArchive,
        read_file(&args.materials)?,
    );

    let params = MosaicParams::new(args.tile_size)
        .with_no_repeat_k(args.no_repeat)
        .with_color_strength(args.color_strength)
        .with_overlay_strength(args.overlay_strength);
    params.validate()?;

    let scheduler = Scheduler::new(SchedulerConfig::default());

    let name = args
        .materials
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "materials".to_string());
    let archive = registry.fetch_owned(&session, &archive_id)?;
    let material = scheduler.submit_ingest(archive.to_vec(), name);

    let bar = percent_bar("Ingesting");
    let snap = track_material(&material, &bar).await;
    if snap.status != MaterialStatus::Ready {
        return Err(CliError::Ingest(snap.message));
    }
    println!("Material set ready: {} tiles", snap.tile_count);

    let target = registry.fetch_owned(&session, &target_id)?;
    let job = scheduler.submit_mosaic(target.to_vec(), material.id(), params)?;
    info!(job_id = %job.id(), "mosaic job submitted");

    let bar = percent_bar("Rendering");
    let snap = track_job(&job, &bar).await;
    if snap.status != JobStatus::Done {
        return Err(CliError::Job(snap.message));
    }

    let result = job
        .result()
        .ok_or_else(|| CliError::Job("result missing after completion".to_string()))?;
    fs::write(&args.output, result.as_slice()).map_err(|error| CliError::FileWrite {
        path: args.output.display().to_string(),
        error,
    })?;

    println!("Wrote {} ({} bytes)", args.output.display(), result.len());
    scheduler.shutdown();
    Ok(())
}

fn read_file(path: &PathBuf) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })
}
