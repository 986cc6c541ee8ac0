//! Playback queue
//!
//! An ordered list of tracks plus a cursor. The queue is replaced wholesale
//! whenever the UI loads a new list (single track, playlist, filtered library
//! view) and is never edited element by element during playback.
//!
//! ```text
//!   tracks:  [ A ][ B ][ C ][ D ]
//!   cursor:        ^
//! ```
//!
//! `load`, `advance` and `retreat` are the only cursor mutators.

use crate::error::{PlaybackError, Result};
use crate::shuffle;
use crate::types::RepeatMode;
use heyjack_core::{Track, TrackId};
use rand::Rng;
use std::collections::HashSet;
use tracing::warn;

/// What caused an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// The user pressed "next"
    Manual,

    /// The current track played to its end
    TrackEnded,
}

/// Inputs of the advance policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvancePolicy {
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub trigger: AdvanceTrigger,
    /// Exclude the current index when shuffling
    pub avoid_repeat: bool,
}

/// Ordered tracks plus a cursor
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,

    /// `Some(i)` with `i < tracks.len()` whenever `tracks` is non-empty
    cursor: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale
    ///
    /// An empty `tracks` clears the queue whatever `start_index` is. On error
    /// the queue is left untouched.
    pub fn load(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        if tracks.is_empty() {
            self.clear();
            return Ok(());
        }

        if start_index >= tracks.len() {
            return Err(PlaybackError::InvalidIndex {
                index: start_index,
                len: tracks.len(),
            });
        }
        ensure_unique_ids(&tracks)?;

        self.tracks = tracks;
        self.cursor = Some(start_index);
        Ok(())
    }

    /// Rebuild a queue from persisted data without trusting it
    ///
    /// Duplicate ids are dropped (first occurrence wins) and an out-of-range
    /// cursor is clamped to the last track.
    pub fn restore(tracks: Vec<Track>, cursor: Option<usize>) -> Self {
        let total = tracks.len();
        let mut seen = HashSet::with_capacity(total);
        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|track| seen.insert(track.id.clone()))
            .collect();
        if tracks.len() != total {
            warn!(
                dropped = total - tracks.len(),
                "restored queue contained duplicate track ids"
            );
        }

        let cursor = if tracks.is_empty() {
            None
        } else {
            let requested = cursor.unwrap_or(0);
            if requested >= tracks.len() {
                warn!(
                    requested,
                    len = tracks.len(),
                    "restored queue cursor out of bounds, clamping"
                );
            }
            Some(requested.min(tracks.len() - 1))
        };

        Self { tracks, cursor }
    }

    /// Remove every track
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = None;
    }

    /// Track at the cursor
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|index| self.tracks.get(index))
    }

    /// Cursor position, `None` when empty
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Move the cursor forward according to `policy`
    ///
    /// Returns the new current track, or `None` with the cursor unchanged
    /// when there is no next track (end of a non-repeating queue).
    pub fn advance<R: Rng + ?Sized>(&mut self, policy: AdvancePolicy, rng: &mut R) -> Option<&Track> {
        let next = self.next_index(policy, rng)?;
        self.cursor = Some(next);
        self.current()
    }

    /// Move the cursor back one track
    ///
    /// Wraps from the first track to the last regardless of repeat mode.
    /// Shuffle does not affect retreat.
    pub fn retreat(&mut self) -> Option<&Track> {
        let cursor = self.cursor?;
        let previous = if cursor == 0 {
            self.tracks.len() - 1
        } else {
            cursor - 1
        };
        self.cursor = Some(previous);
        self.current()
    }

    fn next_index<R: Rng + ?Sized>(&self, policy: AdvancePolicy, rng: &mut R) -> Option<usize> {
        let cursor = self.cursor?;
        let last = self.tracks.len() - 1;

        if policy.trigger == AdvanceTrigger::TrackEnded && policy.repeat == RepeatMode::One {
            return Some(cursor);
        }

        if policy.shuffle {
            return shuffle::pick_index(self.tracks.len(), Some(cursor), policy.avoid_repeat, rng);
        }

        if cursor < last {
            Some(cursor + 1)
        } else if policy.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    /// All tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Get track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Index of the track with `id`
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|track| &track.id == id)
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

fn ensure_unique_ids(tracks: &[Track]) -> Result<()> {
    let mut seen = HashSet::with_capacity(tracks.len());
    for track in tracks {
        if !seen.insert(&track.id) {
            return Err(PlaybackError::DuplicateTrack(track.id.clone()));
        }
    }
    Ok(())
}
