//! Error types for playback management
//!
//! Only failures that are rejected synchronously live here. Backend failures
//! (unreadable file, device error) are not Rust errors: they arrive as
//! [`BackendEvent::Error`](crate::BackendEvent::Error) and surface through the
//! `Errored` state of the engine.

use heyjack_core::TrackId;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Start index outside a non-empty track list
    #[error("Invalid start index {index} for a queue of {len} tracks")]
    InvalidIndex { index: usize, len: usize },

    /// The same track id appears twice in one queue
    #[error("Duplicate track in queue: {0}")]
    DuplicateTrack(TrackId),

    /// The player service task is no longer running
    #[error("Player service stopped")]
    ServiceStopped,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
