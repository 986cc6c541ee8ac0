/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Artist placeholder used when a file carries no artist tag
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Album placeholder used when a file carries no album tag
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Audio track
///
/// Immutable value handed out by the library source and the playlist store.
/// The playback engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Locator handed to the audio backend
    pub path: PathBuf,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Track duration in milliseconds, `None` until known
    #[serde(default)]
    pub duration_ms: Option<u64>,

    /// Track number
    #[serde(default)]
    pub track_number: Option<u32>,

    /// Release year
    #[serde(default)]
    pub year: Option<u32>,

    /// Genre
    #[serde(default)]
    pub genre: Option<String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: TrackId, path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            title: title.into(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            duration_ms: None,
            track_number: None,
            year: None,
            genre: None,
        }
    }

    /// Set the artist
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the album
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Set the duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    /// Track duration in seconds, 0.0 when unknown
    pub fn duration_secs(&self) -> f64 {
        self.duration().map_or(0.0, |d| d.as_secs_f64())
    }
}
