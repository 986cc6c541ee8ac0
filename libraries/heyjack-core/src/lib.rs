//! Hey Jack Core
//!
//! Domain types shared by the playback engine, the library scanner and the
//! playlist store.
//!
//! The core crate only describes *what* a track is. It never touches the
//! filesystem, never decodes audio and never talks to a database; those are
//! the jobs of the crates that consume these types.
//!
//! # Example
//!
//! ```rust
//! use heyjack_core::{Track, TrackId};
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! let path = PathBuf::from("/music/song.flac");
//! let track = Track::new(TrackId::from_path(&path), path, "My Song")
//!     .with_artist("Artist Name")
//!     .with_duration(Duration::from_secs(180));
//!
//! assert_eq!(track.duration_secs(), 180.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod types;

pub use types::{Track, TrackId, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
