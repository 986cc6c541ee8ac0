//! Tracks from file paths
//!
//! The CLI has no library scanner. Each path becomes a track with a stable id
//! derived from the path and the file stem as title; the simulated backend
//! decides the duration.

use crate::error::{CliError, Result};
use heyjack_core::{Track, TrackId};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::warn;

/// Build a queue from `paths`
///
/// Repeated paths are kept once. With `strict`, every path must exist.
pub fn tracks_from_paths(paths: &[PathBuf], strict: bool) -> Result<Vec<Track>> {
    let mut seen = HashSet::new();
    let mut tracks = Vec::with_capacity(paths.len());

    for path in paths {
        if strict && !path.exists() {
            return Err(CliError::MissingTrack(path.clone()));
        }
        if !seen.insert(path) {
            warn!(path = %path.display(), "skipping repeated path");
            continue;
        }

        let title = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned());
        tracks.push(Track::new(TrackId::from_path(path), path.clone(), title));
    }

    Ok(tracks)
}
