//! Core types for playback management

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the repeat button cycle: off -> all -> one -> off
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

impl std::str::FromStr for RepeatMode {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(RepeatMode::Off),
            "all" => Ok(RepeatMode::All),
            "one" => Ok(RepeatMode::One),
            other => Err(PlaybackError::Config(format!(
                "unknown repeat mode '{other}' (expected off, all or one)"
            ))),
        }
    }
}

/// Playback state machine status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// No track loaded in the backend
    #[default]
    Idle,

    /// Track selected, backend source not ready yet
    Loading,

    /// Audio is playing
    Playing,

    /// Paused mid-track (or stopped at the end of the queue)
    Paused,

    /// Current track finished; the engine advances immediately
    Ended,

    /// Current track failed to load or play
    Errored,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 0.8)
    pub volume: f32,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Never pick the current track again when shuffling (default: true)
    pub shuffle_avoid_repeat: bool,

    /// Seconds into a track after which "previous" restarts it (default: 3.0)
    pub restart_threshold_secs: f64,

    /// Position sampling period in milliseconds (default: 16, ~60 Hz)
    pub sample_interval_ms: u64,

    /// Fixed seed for the shuffle RNG (default: none, seeded from entropy)
    pub shuffle_seed: Option<u64>,

    /// Capacity of the playback event broadcast channel (default: 64)
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            repeat: RepeatMode::Off,
            shuffle: false,
            shuffle_avoid_repeat: true,
            restart_threshold_secs: 3.0,
            sample_interval_ms: 16,
            shuffle_seed: None,
            event_capacity: 64,
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() {
            return Err(PlaybackError::Config("volume must be a finite number".into()));
        }
        if !self.restart_threshold_secs.is_finite() || self.restart_threshold_secs < 0.0 {
            return Err(PlaybackError::Config(
                "restart_threshold_secs must be a non-negative number".into(),
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "sample_interval_ms must be greater than zero".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(PlaybackError::Config(
                "event_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// "Previous" restart threshold, the default when the configured value
    /// is negative or not finite
    pub fn restart_threshold(&self) -> f64 {
        if self.restart_threshold_secs.is_finite() && self.restart_threshold_secs >= 0.0 {
            self.restart_threshold_secs
        } else {
            Self::default().restart_threshold_secs
        }
    }

    /// Position sampling period
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
