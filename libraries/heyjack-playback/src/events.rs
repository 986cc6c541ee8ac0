//! Playback events
//!
//! The engine records one event per observable change and the service
//! broadcasts them. Position sampling does not emit events; observers that
//! need the live playhead read snapshots instead.

use crate::types::{PlaybackStatus, RepeatMode};
use heyjack_core::TrackId;
use serde::{Deserialize, Serialize};

/// Observable change in the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// State machine moved to a new status
    StateChanged { state: PlaybackStatus },

    /// A different track became current
    TrackChanged {
        track_id: TrackId,
        previous_track_id: Option<TrackId>,
    },

    /// The current track played to its end
    TrackEnded { track_id: TrackId },

    /// Playhead moved by a seek or restart
    PositionChanged { position: f64, duration: f64 },

    /// Volume or mute changed
    VolumeChanged { volume: f32, muted: bool },

    /// Queue replaced
    QueueChanged { length: usize },

    /// Repeat or shuffle changed
    ModesChanged { repeat: RepeatMode, shuffle: bool },

    /// The current track failed in the backend
    Error {
        track_id: Option<TrackId>,
        message: String,
    },
}
