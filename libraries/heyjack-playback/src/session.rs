//! Persisted player session
//!
//! What survives a restart: volume, the queue with its cursor, and the
//! repeat/shuffle modes. Storage is up to the caller; the engine only builds a
//! session and validates one on restore.

use crate::types::RepeatMode;
use heyjack_core::Track;
use serde::{Deserialize, Serialize};

/// Saved player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSession {
    pub volume: f32,
    pub tracks: Vec<Track>,
    pub cursor: Option<usize>,
    pub repeat: RepeatMode,
    pub shuffle: bool,
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self {
            volume: crate::transport::DEFAULT_VOLUME,
            tracks: Vec::new(),
            cursor: None,
            repeat: RepeatMode::Off,
            shuffle: false,
        }
    }
}
