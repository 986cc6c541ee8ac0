//! Transport state
//!
//! The authoritative record of what the player is doing: which track is
//! current, whether it is meant to be audible, where the playhead is, and the
//! repeat/shuffle/volume settings. Only the engine writes to it.

use crate::types::RepeatMode;
use heyjack_core::TrackId;
use serde::{Deserialize, Serialize};

/// Default volume for a fresh engine
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Transport state record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    /// Id of the queue's current track; never owns the track
    pub current_track_id: Option<TrackId>,

    /// Playback intent: true while playing, or while a load that will
    /// start playing is pending
    pub playing: bool,

    /// Volume level in [0, 1], kept while muted
    pub volume: f32,

    /// Mute flag; the backend receives 0 while set
    pub muted: bool,

    /// Playhead in seconds
    pub position: f64,

    /// Track length in seconds, 0 when unknown
    pub duration: f64,

    pub repeat: RepeatMode,

    pub shuffle: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME, RepeatMode::Off, false)
    }
}

impl TransportState {
    /// Create a stopped transport with the given settings
    pub fn new(volume: f32, repeat: RepeatMode, shuffle: bool) -> Self {
        Self {
            current_track_id: None,
            playing: false,
            volume: clamp_volume(volume).unwrap_or(DEFAULT_VOLUME),
            muted: false,
            position: 0.0,
            duration: 0.0,
            repeat,
            shuffle,
        }
    }

    /// Volume the backend should actually use
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Clamp a playhead target into `[0, duration]`
    ///
    /// With an unknown duration only the lower bound applies and an infinite
    /// target maps to 0. NaN maps to 0.
    pub fn clamp_position(&self, seconds: f64) -> f64 {
        if seconds.is_nan() || seconds <= 0.0 {
            return 0.0;
        }
        if self.duration > 0.0 {
            seconds.min(self.duration)
        } else if seconds.is_finite() {
            seconds
        } else {
            0.0
        }
    }

    /// Whether the playhead sits at the end of a track of known length
    pub fn at_end(&self) -> bool {
        self.duration > 0.0 && self.position >= self.duration
    }

    pub(crate) fn begin_track(&mut self, id: TrackId, duration: f64) {
        self.current_track_id = Some(id);
        self.position = 0.0;
        self.duration = sanitize_duration(duration);
    }

    pub(crate) fn set_duration(&mut self, duration: f64) {
        self.duration = sanitize_duration(duration);
        self.position = self.clamp_position(self.position);
    }

    pub(crate) fn clear_track(&mut self) {
        self.current_track_id = None;
        self.playing = false;
        self.position = 0.0;
        self.duration = 0.0;
    }
}

/// Clamp a volume into `[0, 1]`; `None` for NaN
pub fn clamp_volume(volume: f32) -> Option<f32> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}
