//! Hey Jack CLI Library
//!
//! Drives the playback engine from the command line over a simulated audio
//! backend: configuration, track lists, scripted intents and session files.
//!
//! This library exposes the building blocks of the `heyjack` binary for testing.

pub mod app;
pub mod config;
pub mod error;
pub mod format;
pub mod script;
pub mod session_file;
pub mod tracks;

// Re-export commonly used types for convenience
pub use app::{run_player, PlayOptions};
pub use config::AppConfig;
pub use error::{CliError, Result};
