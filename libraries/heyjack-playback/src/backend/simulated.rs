//! Clock-driven backend that plays nothing
//!
//! Behaves like a real single-stream player as far as the engine can tell:
//! loads complete after a latency, elapsed time follows the tokio clock while
//! playing, and `Ended` fires when the playhead reaches the track length.
//! Used by the CLI dry runs and by the service tests (with a paused clock).
//!
//! Must be driven from inside a tokio runtime.

use super::{AudioBackend, BackendEvent, BackendEventSender, LoadId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Length reported for paths without an explicit duration
const DEFAULT_DURATION_SECS: f64 = 180.0;

/// Simulated audio backend
pub struct SimulatedBackend {
    events: BackendEventSender,
    durations: HashMap<PathBuf, f64>,
    failures: HashMap<PathBuf, String>,
    default_duration: f64,
    load_latency: Duration,

    current: Option<LoadId>,
    duration: f64,
    /// Playhead at the last pause, seek or load
    offset: f64,
    /// Set while playing
    started_at: Option<Instant>,
    volume: f32,

    load_task: Option<JoinHandle<()>>,
    end_task: Option<JoinHandle<()>>,
}

impl SimulatedBackend {
    /// Create a backend reporting through `events`
    pub fn new(events: BackendEventSender) -> Self {
        Self {
            events,
            durations: HashMap::new(),
            failures: HashMap::new(),
            default_duration: DEFAULT_DURATION_SECS,
            load_latency: Duration::from_millis(20),
            current: None,
            duration: 0.0,
            offset: 0.0,
            started_at: None,
            volume: 1.0,
            load_task: None,
            end_task: None,
        }
    }

    /// Report `secs` as the length of `path`
    #[must_use]
    pub fn with_duration(mut self, path: impl Into<PathBuf>, secs: f64) -> Self {
        self.durations.insert(path.into(), secs);
        self
    }

    /// Fail every load of `path` with `reason`
    #[must_use]
    pub fn with_failure(mut self, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        self.failures.insert(path.into(), reason.into());
        self
    }

    /// Length for paths without an explicit duration
    #[must_use]
    pub fn with_default_duration(mut self, secs: f64) -> Self {
        self.default_duration = secs;
        self
    }

    /// Delay between `load` and its `Loaded`/`Error` event
    #[must_use]
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Last volume set by the engine
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Whether the simulated output is running
    pub fn is_playing(&self) -> bool {
        self.started_at.is_some() && !self.reached_end()
    }

    fn reached_end(&self) -> bool {
        self.duration > 0.0 && self.elapsed() >= self.duration
    }

    /// Stop the clock once the playhead has run to the end of the track
    fn settle(&mut self) {
        if self.started_at.is_some() && self.reached_end() {
            self.offset = self.duration;
            self.started_at = None;
            self.end_task = None;
        }
    }

    fn cancel_end_timer(&mut self) {
        if let Some(task) = self.end_task.take() {
            task.abort();
        }
    }

    fn schedule_end(&mut self) {
        self.cancel_end_timer();

        let Some(load) = self.current else {
            return;
        };
        if self.duration <= 0.0 {
            return;
        }

        let remaining = Duration::from_secs_f64((self.duration - self.offset).max(0.0));
        let events = self.events.clone();
        self.end_task = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = events.send(BackendEvent::Ended { load });
        }));
    }
}

impl AudioBackend for SimulatedBackend {
    fn load(&mut self, load: LoadId, path: &Path) {
        self.cancel_end_timer();
        if let Some(task) = self.load_task.take() {
            task.abort();
        }

        self.current = Some(load);
        self.offset = 0.0;
        self.started_at = None;

        let event = match self.failures.get(path) {
            Some(reason) => {
                self.duration = 0.0;
                BackendEvent::Error {
                    load,
                    reason: reason.clone(),
                }
            }
            None => {
                self.duration = self
                    .durations
                    .get(path)
                    .copied()
                    .unwrap_or(self.default_duration);
                BackendEvent::Loaded {
                    load,
                    duration: self.duration,
                }
            }
        };
        debug!(%load, path = %path.display(), "simulated load");

        let events = self.events.clone();
        let latency = self.load_latency;
        self.load_task = Some(tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let _ = events.send(event);
        }));
    }

    fn play(&mut self) {
        self.settle();
        if self.current.is_none() || self.started_at.is_some() {
            return;
        }
        trace!(offset = self.offset, "simulated play");
        self.started_at = Some(Instant::now());
        self.schedule_end();
    }

    fn pause(&mut self) {
        self.offset = self.elapsed();
        self.started_at = None;
        self.cancel_end_timer();
    }

    fn seek(&mut self, position: f64) {
        self.settle();
        self.offset = if self.duration > 0.0 {
            position.clamp(0.0, self.duration)
        } else {
            position.max(0.0)
        };
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
            self.schedule_end();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn elapsed(&self) -> f64 {
        let running = self
            .started_at
            .map_or(0.0, |started| started.elapsed().as_secs_f64());
        let elapsed = self.offset + running;
        if self.duration > 0.0 {
            elapsed.min(self.duration)
        } else {
            elapsed
        }
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        self.cancel_end_timer();
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }
}
