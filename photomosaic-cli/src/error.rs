//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use photomosaic::MosaicError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// Failed to write the output file
    FileWrite { path: String, error: std::io::Error },
    /// Material archive could not be ingested
    Ingest(String),
    /// Mosaic job was rejected or failed
    Job(String),
    /// Error surfaced from the mosaic library
    Pipeline(MosaicError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Ingest(_) => {
                eprintln!();
                eprintln!("The material archive must be a zip containing at least one");
                eprintln!("decodable image (jpg, jpeg, png, or webp).");
            }
            CliError::Pipeline(MosaicError::PreconditionFailed(_)) => {
                eprintln!();
                eprintln!("Make sure the material set finished ingesting before rendering.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Ingest(msg) => write!(f, "Material ingest failed: {}", msg),
            CliError::Job(msg) => write!(f, "Mosaic job failed: {}", msg),
            CliError::Pipeline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MosaicError> for CliError {
    fn from(e: MosaicError) -> Self {
        CliError::Pipeline(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Ingest("empty archive".to_string());
        assert_eq!(format!("{}", err), "Material ingest failed: empty archive");

        let err = CliError::Pipeline(MosaicError::InvalidInput("bad target".to_string()));
        assert_eq!(format!("{}", err), "invalid input: bad target");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = CliError::FileRead {
            path: "missing.png".to_string(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());

        let err = CliError::Job("cancelled".to_string());
        assert!(err.source().is_none());
    }
}
