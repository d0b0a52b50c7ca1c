//! Photomosaic CLI - Command-line interface
//!
//! This binary provides a command-line interface to the photomosaic library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use photomosaic::logging::{default_log_dir, default_log_file, init_logging};

#[derive(Parser)]
#[command(name = "photomosaic")]
#[command(version = photomosaic::VERSION)]
#[command(about = "Reconstruct a photograph as a mosaic of material images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a material archive and render a mosaic of a target image
    Render(commands::render::RenderArgs),

    /// Ingest a material archive and report usable tile counts
    Inspect(commands::inspect::InspectArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match cli.command {
        Command::Render(args) => commands::render::run(args).await,
        Command::Inspect(args) => commands::inspect::run(args).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}
