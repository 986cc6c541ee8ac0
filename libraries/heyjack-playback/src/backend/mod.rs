//! Audio backend capability
//!
//! The engine drives exactly one backend: an opaque single-stream player that
//! can load a source, play, pause, seek, change volume and report elapsed
//! time. Decoding and device output live behind this trait.
//!
//! Commands never fail synchronously. Their outcome arrives later as a
//! [`BackendEvent`] on the channel handed to the backend when it was built.
//! Every event carries the [`LoadId`] of the `load` command it belongs to, so
//! the engine can drop events from a load that has since been superseded.

mod simulated;

pub use simulated::SimulatedBackend;

use std::fmt;
use std::path::Path;
use tokio::sync::mpsc;

/// Identifies one `load` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

impl LoadId {
    /// Wrap a raw id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Events emitted by an audio backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Source is ready; `duration` in seconds, 0 or non-finite when unknown
    Loaded { load: LoadId, duration: f64 },

    /// Source played to its end
    Ended { load: LoadId },

    /// Source failed to load or to keep playing
    Error { load: LoadId, reason: String },
}

impl BackendEvent {
    /// Load command this event answers
    pub fn load_id(&self) -> LoadId {
        match self {
            BackendEvent::Loaded { load, .. }
            | BackendEvent::Ended { load }
            | BackendEvent::Error { load, .. } => *load,
        }
    }
}

/// Sending half given to a backend
pub type BackendEventSender = mpsc::UnboundedSender<BackendEvent>;

/// Receiving half consumed by the player service
pub type BackendEventReceiver = mpsc::UnboundedReceiver<BackendEvent>;

/// Create the channel a backend reports through
pub fn event_channel() -> (BackendEventSender, BackendEventReceiver) {
    mpsc::unbounded_channel()
}

/// Single-stream audio player driven by the engine
///
/// Implementations must not block: every command returns immediately and
/// reports completion or failure through [`BackendEvent`]s.
pub trait AudioBackend: Send {
    /// Replace the current source with the file at `path`
    ///
    /// Stops whatever was playing. Answers with `Loaded` or `Error` tagged
    /// with `load`.
    fn load(&mut self, load: LoadId, path: &Path);

    /// Start or resume the loaded source
    fn play(&mut self);

    /// Stop output, keeping the position
    fn pause(&mut self);

    /// Move the playhead to `position` seconds
    fn seek(&mut self, position: f64);

    /// Output volume in [0, 1]
    fn set_volume(&mut self, volume: f32);

    /// Seconds elapsed in the loaded source
    fn elapsed(&self) -> f64;
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn load(&mut self, load: LoadId, path: &Path) {
        (**self).load(load, path);
    }

    fn play(&mut self) {
        (**self).play();
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek(&mut self, position: f64) {
        (**self).seek(position);
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn elapsed(&self) -> f64 {
        (**self).elapsed()
    }
}
