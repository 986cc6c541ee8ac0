//! Hey Jack - Playback & Queue Engine
//!
//! Owns a queue of tracks, drives a single audio backend and exposes
//! deterministic transport semantics to a UI layer.
//!
//! This crate provides:
//! - A queue replaced wholesale per list, with a cursor
//! - Linear, shuffled, repeat-all and repeat-one advance policies
//! - "Previous" that restarts the track after a few seconds
//! - Volume with clamping and mute
//! - Stale-load suppression for overlapping track selections
//! - A position sampler scoped to the playing state
//! - Session save/restore with validation
//!
//! # Architecture
//!
//! - [`PlaybackEngine`] is a synchronous state machine generic over an
//!   [`AudioBackend`]. It never blocks and never spawns.
//! - [`PlayerHandle`] runs the engine inside one tokio task, the single
//!   serialization point for intents, backend events and position ticks.
//!   State is observed through a `watch` snapshot and a `broadcast` event
//!   feed.
//!
//! Decoding and device output are the backend's business. The crate ships a
//! [`SimulatedBackend`] that follows the tokio clock.
//!
//! # Example: Driving the engine directly
//!
//! ```rust
//! use heyjack_core::{Track, TrackId};
//! use heyjack_playback::{
//!     AudioBackend, BackendEvent, LoadId, PlaybackConfig, PlaybackEngine, PlaybackStatus,
//! };
//! use std::path::Path;
//!
//! #[derive(Default)]
//! struct Silent;
//!
//! impl AudioBackend for Silent {
//!     fn load(&mut self, _load: LoadId, _path: &Path) {}
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _position: f64) {}
//!     fn set_volume(&mut self, _volume: f32) {}
//!     fn elapsed(&self) -> f64 {
//!         0.0
//!     }
//! }
//!
//! let mut engine = PlaybackEngine::new(Silent, PlaybackConfig::default());
//! let tracks = vec![
//!     Track::new(TrackId::new("a"), "/music/a.mp3", "A"),
//!     Track::new(TrackId::new("b"), "/music/b.mp3", "B"),
//! ];
//!
//! engine.play_queue(tracks, 1).unwrap();
//! assert_eq!(engine.status(), PlaybackStatus::Loading);
//!
//! // The backend answers asynchronously
//! engine.handle_backend_event(BackendEvent::Loaded {
//!     load: LoadId::new(1),
//!     duration: 200.0,
//! });
//! assert_eq!(engine.status(), PlaybackStatus::Playing);
//!
//! engine.set_volume(1.5);
//! assert_eq!(engine.transport().volume, 1.0);
//! ```
//!
//! # Example: Running the service
//!
//! ```rust,no_run
//! use heyjack_playback::{
//!     event_channel, PlaybackConfig, PlaybackEngine, PlayerHandle, SimulatedBackend,
//! };
//!
//! # async fn run(tracks: Vec<heyjack_core::Track>) -> heyjack_playback::Result<()> {
//! let (events_tx, events_rx) = event_channel();
//! let engine = PlaybackEngine::new(SimulatedBackend::new(events_tx), PlaybackConfig::default());
//! let (player, task) = PlayerHandle::spawn(engine, events_rx)?;
//!
//! player.play_queue(tracks, 0).await?;
//! player.next()?;
//! println!("{:?}", player.snapshot().status);
//!
//! player.shutdown()?;
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```

mod backend;
mod engine;
mod error;
mod events;
mod queue;
mod sampler;
mod service;
mod session;
mod shuffle;
mod transport;
pub mod types;

// Public exports
pub use backend::{
    event_channel, AudioBackend, BackendEvent, BackendEventReceiver, BackendEventSender, LoadId,
    SimulatedBackend,
};
pub use engine::{PlaybackEngine, PlayerSnapshot};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use queue::{AdvancePolicy, AdvanceTrigger, Queue};
pub use sampler::{PositionSampler, SamplerGuard};
pub use service::PlayerHandle;
pub use session::PersistedSession;
pub use shuffle::pick_index;
pub use transport::{clamp_volume, TransportState, DEFAULT_VOLUME};
pub use types::{PlaybackConfig, PlaybackStatus, RepeatMode};
