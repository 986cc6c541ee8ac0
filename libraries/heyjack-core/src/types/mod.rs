//! Domain types

mod ids;
mod track;

pub use ids::TrackId;
pub use track::{Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
