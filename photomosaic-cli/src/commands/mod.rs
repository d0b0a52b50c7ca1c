//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`render`] - Ingest a material archive and render a mosaic of a target
//! - [`inspect`] - Ingest a material archive and report what survived

pub mod inspect;
pub mod progress;
pub mod render;
