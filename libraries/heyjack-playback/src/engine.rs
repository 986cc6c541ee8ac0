//! Playback engine - the state machine
//!
//! Orchestrates the queue and the transport state against one audio backend.
//! Every method takes `&mut self` and runs to completion, so callers that
//! share an engine must serialize access (see [`crate::PlayerHandle`]).
//!
//! ```text
//!            load_queue / next / previous / advance
//!   Idle ───────────────────────────────► Loading ──loaded──► Playing ⇄ Paused
//!                                             │                  │ ended
//!                                           error                ▼
//!                                             ▼               Ended ──► advance
//!                                          Errored
//! ```
//!
//! Backend commands are asynchronous. Each `load` gets a fresh [`LoadId`] and
//! backend events carrying an older id are ignored, so the most recent track
//! selection always wins over an in-flight load.

use crate::{
    backend::{AudioBackend, BackendEvent, LoadId},
    error::Result,
    events::PlaybackEvent,
    queue::{AdvancePolicy, AdvanceTrigger, Queue},
    session::PersistedSession,
    transport::{clamp_volume, TransportState, DEFAULT_VOLUME},
    types::{PlaybackConfig, PlaybackStatus, RepeatMode},
};
use heyjack_core::{Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Read-only view of the player for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub status: PlaybackStatus,
    pub transport: TransportState,
    pub current_track: Option<Track>,
    pub cursor: Option<usize>,
    pub queue_len: usize,
    /// Reason of the last backend failure, cleared on the next load
    pub last_error: Option<String>,
}

/// Playback state machine
pub struct PlaybackEngine<B: AudioBackend> {
    backend: B,
    queue: Queue,
    transport: TransportState,
    status: PlaybackStatus,
    config: PlaybackConfig,
    rng: StdRng,

    /// Id of the latest load command; events for other ids are stale
    load_id: LoadId,

    /// Seek requested before the current load completed
    pending_seek: Option<f64>,

    /// Bumped on every entry into `Playing`
    session: u64,

    last_error: Option<String>,
    pending_events: Vec<PlaybackEvent>,
}

impl<B: AudioBackend> PlaybackEngine<B> {
    /// Create an engine with an empty queue
    ///
    /// Invalid settings are not rejected here; [`crate::PlayerHandle::spawn`]
    /// refuses them. Driven directly, the engine falls back to defaults for
    /// the volume and the restart threshold.
    pub fn new(mut backend: B, config: PlaybackConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "invalid playback config, using defaults where needed");
        }
        let transport = TransportState::new(config.volume, config.repeat, config.shuffle);
        backend.set_volume(transport.effective_volume());

        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            backend,
            queue: Queue::new(),
            transport,
            status: PlaybackStatus::Idle,
            config,
            rng,
            load_id: LoadId::default(),
            pending_seek: None,
            session: 0,
            last_error: None,
            pending_events: Vec::new(),
        }
    }

    /// Create an engine from a saved session
    ///
    /// The session is validated rather than trusted: volume is clamped,
    /// duplicate tracks dropped and the cursor clamped into range. The engine
    /// starts `Idle` with the restored track current; `play` loads it.
    pub fn restore(backend: B, config: PlaybackConfig, session: PersistedSession) -> Self {
        let mut engine = Self::new(backend, config);

        engine.transport.volume = clamp_volume(session.volume).unwrap_or_else(|| {
            warn!("restored volume is not a number, using default");
            DEFAULT_VOLUME
        });
        engine.transport.repeat = session.repeat;
        engine.transport.shuffle = session.shuffle;
        engine.backend.set_volume(engine.transport.effective_volume());

        engine.queue = Queue::restore(session.tracks, session.cursor);
        if let Some(track) = engine.queue.current() {
            let (id, duration) = (track.id.clone(), track.duration_secs());
            engine.transport.begin_track(id, duration);
        }

        info!(
            tracks = engine.queue.len(),
            cursor = ?engine.queue.cursor(),
            "restored playback session"
        );
        engine
    }

    // ===== Queue =====

    /// Replace the queue and select `tracks[start_index]`
    ///
    /// Playback continues on the new track if the player was playing.
    /// An empty list clears the queue and stops.
    pub fn load_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        let autoplay = self.transport.playing;
        self.replace_queue(tracks, start_index, autoplay)
    }

    /// Replace the queue and start playing `tracks[start_index]`
    pub fn play_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.replace_queue(tracks, start_index, true)
    }

    fn replace_queue(&mut self, tracks: Vec<Track>, start_index: usize, autoplay: bool) -> Result<()> {
        self.queue.load(tracks, start_index)?;
        info!(len = self.queue.len(), start_index, autoplay, "queue loaded");
        self.emit_queue_changed();

        if self.queue.is_empty() {
            self.stop_and_clear();
        } else {
            self.load_current(autoplay);
        }
        Ok(())
    }

    // ===== Transport =====

    /// Start or resume playback
    ///
    /// From `Paused` at the end of a track the track restarts. From `Idle`,
    /// `Errored` or `Ended` the current track is (re)loaded. During `Loading`
    /// the pending load will start playing. No-op on an empty queue.
    pub fn play(&mut self) {
        match self.status {
            PlaybackStatus::Playing => {}
            PlaybackStatus::Loading => self.transport.playing = true,
            PlaybackStatus::Paused => {
                if self.transport.at_end() {
                    self.transport.position = 0.0;
                    self.backend.seek(0.0);
                    self.emit_position_changed();
                }
                self.transport.playing = true;
                self.backend.play();
                self.set_status(PlaybackStatus::Playing);
            }
            PlaybackStatus::Idle | PlaybackStatus::Errored | PlaybackStatus::Ended => {
                if self.queue.current().is_none() {
                    debug!("play ignored: queue is empty");
                    return;
                }
                let resume = self.pending_seek.take();
                self.load_current(true);
                if let Some(position) = resume {
                    let position = self.transport.clamp_position(position);
                    self.pending_seek = Some(position);
                    self.transport.position = position;
                }
            }
        }
    }

    /// Pause playback, keeping the position
    pub fn pause(&mut self) {
        match self.status {
            PlaybackStatus::Playing => {
                self.transport.position = self.transport.clamp_position(self.backend.elapsed());
                self.backend.pause();
                self.transport.playing = false;
                self.set_status(PlaybackStatus::Paused);
            }
            PlaybackStatus::Loading => self.transport.playing = false,
            _ => {}
        }
    }

    /// Toggle between play and pause
    pub fn play_pause(&mut self) {
        if self.transport.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Skip to the next track per the advance policy
    ///
    /// At the end of a non-repeating, non-shuffled queue nothing happens.
    pub fn next(&mut self) {
        let autoplay = self.transport.playing;
        let policy = self.advance_policy(AdvanceTrigger::Manual);
        if self.queue.advance(policy, &mut self.rng).is_some() {
            self.load_current(autoplay);
        } else {
            debug!(cursor = ?self.queue.cursor(), "next ignored: no next track");
        }
    }

    /// Go back one track, or restart the current one
    ///
    /// Past `restart_threshold_secs` into the track it restarts from 0;
    /// otherwise the cursor moves back, wrapping from the first track to the
    /// last.
    pub fn previous(&mut self) {
        if self.queue.is_empty() {
            debug!("previous ignored: queue is empty");
            return;
        }

        if self.live_position() > self.config.restart_threshold() {
            self.restart_current();
            return;
        }

        let autoplay = self.transport.playing;
        if self.queue.retreat().is_some() {
            self.load_current(autoplay);
        }
    }

    /// Move the playhead, clamped to `[0, duration]`
    ///
    /// Does not change whether the player is playing.
    pub fn seek(&mut self, seconds: f64) {
        if self.transport.current_track_id.is_none() {
            debug!("seek ignored: no current track");
            return;
        }

        let target = self.transport.clamp_position(seconds);
        self.transport.position = target;
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Paused => self.backend.seek(target),
            PlaybackStatus::Loading | PlaybackStatus::Idle | PlaybackStatus::Errored => {
                self.pending_seek = Some(target);
            }
            PlaybackStatus::Ended => {}
        }
        self.emit_position_changed();
    }

    /// Set the volume, clamped to `[0, 1]`
    ///
    /// A non-zero volume unmutes. NaN is ignored.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            warn!("ignoring volume that is not a number");
            return;
        };
        self.transport.volume = volume;
        if volume > 0.0 {
            self.transport.muted = false;
        }
        self.backend.set_volume(self.transport.effective_volume());
        self.emit_volume_changed();
    }

    /// Mute or unmute, keeping the volume level
    pub fn toggle_mute(&mut self) {
        self.transport.muted = !self.transport.muted;
        self.backend.set_volume(self.transport.effective_volume());
        self.emit_volume_changed();
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        if self.transport.repeat != mode {
            self.transport.repeat = mode;
            self.emit_modes_changed();
        }
    }

    /// Step the repeat mode: off -> all -> one -> off
    pub fn cycle_repeat_mode(&mut self) {
        self.set_repeat_mode(self.transport.repeat.cycled());
    }

    pub fn toggle_shuffle(&mut self) {
        self.transport.shuffle = !self.transport.shuffle;
        self.emit_modes_changed();
    }

    // ===== Backend events =====

    /// React to an event from the backend
    ///
    /// Events from superseded loads are dropped.
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        if event.load_id() != self.load_id {
            debug!(
                event_load = %event.load_id(),
                current_load = %self.load_id,
                "dropping stale backend event"
            );
            return;
        }

        match event {
            BackendEvent::Loaded { duration, .. } => self.on_loaded(duration),
            BackendEvent::Ended { .. } => self.on_ended(),
            BackendEvent::Error { reason, .. } => self.on_error(reason),
        }
    }

    fn on_loaded(&mut self, duration: f64) {
        if self.status != PlaybackStatus::Loading {
            debug!(status = ?self.status, "loaded event outside of loading");
            return;
        }

        // Backend knows better than the library; keep the library value if not
        if duration.is_finite() && duration > 0.0 {
            self.transport.set_duration(duration);
        }

        if let Some(target) = self.pending_seek.take() {
            let target = self.transport.clamp_position(target);
            self.transport.position = target;
            self.backend.seek(target);
        }

        if self.transport.playing {
            self.backend.play();
            self.set_status(PlaybackStatus::Playing);
        } else {
            self.set_status(PlaybackStatus::Paused);
        }
    }

    fn on_ended(&mut self) {
        if self.status != PlaybackStatus::Playing {
            debug!(status = ?self.status, "ended event while not playing");
            return;
        }
        let Some(track_id) = self.transport.current_track_id.clone() else {
            return;
        };

        self.transport.position = if self.transport.duration > 0.0 {
            self.transport.duration
        } else {
            self.backend.elapsed().max(0.0)
        };
        self.set_status(PlaybackStatus::Ended);
        self.emit_track_ended(track_id);

        if self.transport.repeat == RepeatMode::One {
            self.transport.position = 0.0;
            self.transport.playing = true;
            self.backend.seek(0.0);
            self.backend.play();
            self.set_status(PlaybackStatus::Playing);
            self.emit_position_changed();
            return;
        }

        let policy = self.advance_policy(AdvanceTrigger::TrackEnded);
        if self.queue.advance(policy, &mut self.rng).is_some() {
            self.load_current(true);
        } else {
            info!("reached end of queue");
            self.backend.pause();
            self.transport.playing = false;
            self.set_status(PlaybackStatus::Paused);
        }
    }

    fn on_error(&mut self, reason: String) {
        if !matches!(
            self.status,
            PlaybackStatus::Loading | PlaybackStatus::Playing | PlaybackStatus::Paused
        ) {
            debug!(status = ?self.status, "error event outside of playback");
            return;
        }

        warn!(
            track = ?self.transport.current_track_id,
            %reason,
            "playback failed"
        );
        if self.status == PlaybackStatus::Playing {
            self.transport.position = self.transport.clamp_position(self.backend.elapsed());
        }
        self.backend.pause();
        self.pending_seek = None;
        self.transport.playing = false;
        self.last_error = Some(reason.clone());
        self.set_status(PlaybackStatus::Errored);
        self.emit_error(reason);
    }

    // ===== Position sampling =====

    /// Session id of the current `Playing` period, `None` when not playing
    ///
    /// A new id is issued every time the engine enters `Playing`.
    pub fn play_session(&self) -> Option<u64> {
        (self.status == PlaybackStatus::Playing).then_some(self.session)
    }

    /// Mirror the backend's elapsed time into the transport
    ///
    /// Only applies while `session` is the live play session. Returns whether
    /// the position changed.
    pub fn sample_position(&mut self, session: u64) -> bool {
        if self.play_session() != Some(session) {
            trace!(session, "dropping stale position sample");
            return false;
        }
        let position = self.transport.clamp_position(self.backend.elapsed());
        if (position - self.transport.position).abs() < f64::EPSILON {
            return false;
        }
        self.transport.position = position;
        true
    }

    /// Stop talking to the backend
    ///
    /// In-flight loads are invalidated and output is paused. The engine stays
    /// usable; `play` reloads the current track.
    pub fn shutdown(&mut self) {
        self.load_id = self.load_id.next();
        self.pending_seek = None;
        match self.status {
            PlaybackStatus::Playing => {
                self.transport.position = self.transport.clamp_position(self.backend.elapsed());
                self.backend.pause();
                self.transport.playing = false;
                self.set_status(PlaybackStatus::Paused);
            }
            PlaybackStatus::Loading => {
                self.transport.playing = false;
                self.set_status(PlaybackStatus::Idle);
            }
            _ => {}
        }
        debug!("playback engine shut down");
    }

    // ===== State =====

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Track the transport points at
    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current state for the UI
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            status: self.status,
            transport: self.transport.clone(),
            current_track: self.queue.current().cloned(),
            cursor: self.queue.cursor(),
            queue_len: self.queue.len(),
            last_error: self.last_error.clone(),
        }
    }

    /// State worth keeping across restarts
    pub fn session(&self) -> PersistedSession {
        PersistedSession {
            volume: self.transport.volume,
            tracks: self.queue.tracks().to_vec(),
            cursor: self.queue.cursor(),
            repeat: self.transport.repeat,
            shuffle: self.transport.shuffle,
        }
    }

    // ===== Internals =====

    fn advance_policy(&self, trigger: AdvanceTrigger) -> AdvancePolicy {
        AdvancePolicy {
            shuffle: self.transport.shuffle,
            repeat: self.transport.repeat,
            trigger,
            avoid_repeat: self.config.shuffle_avoid_repeat,
        }
    }

    /// Playhead, read from the backend while playing
    fn live_position(&self) -> f64 {
        if self.status == PlaybackStatus::Playing {
            self.transport.clamp_position(self.backend.elapsed())
        } else {
            self.transport.position
        }
    }

    fn restart_current(&mut self) {
        self.transport.position = 0.0;
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Paused => self.backend.seek(0.0),
            _ => self.pending_seek = None,
        }
        self.emit_position_changed();
    }

    /// Load the track under the cursor, superseding any in-flight load
    fn load_current(&mut self, autoplay: bool) {
        let Some(track) = self.queue.current() else {
            self.stop_and_clear();
            return;
        };
        let id = track.id.clone();
        let path = track.path.clone();
        let duration = track.duration_secs();

        let previous = self.transport.current_track_id.clone();
        self.load_id = self.load_id.next();
        self.pending_seek = None;
        self.last_error = None;
        self.transport.begin_track(id.clone(), duration);
        self.transport.playing = autoplay;
        self.set_status(PlaybackStatus::Loading);

        if previous.as_ref() != Some(&id) {
            self.emit_track_changed(id.clone(), previous);
        }

        debug!(load = %self.load_id, track = %id, autoplay, "loading track");
        self.backend.load(self.load_id, &path);
    }

    fn stop_and_clear(&mut self) {
        self.load_id = self.load_id.next();
        self.pending_seek = None;
        self.backend.pause();
        self.transport.clear_track();
        self.set_status(PlaybackStatus::Idle);
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status == status {
            return;
        }
        if status == PlaybackStatus::Playing {
            self.session += 1;
        }
        trace!(from = ?self.status, to = ?status, "status change");
        self.status = status;
        self.pending_events.push(PlaybackEvent::StateChanged { state: status });
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events recorded since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn emit_track_changed(&mut self, track_id: TrackId, previous_track_id: Option<TrackId>) {
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id,
        });
    }

    fn emit_track_ended(&mut self, track_id: TrackId) {
        self.pending_events.push(PlaybackEvent::TrackEnded { track_id });
    }

    fn emit_position_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionChanged {
            position: self.transport.position,
            duration: self.transport.duration,
        });
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            volume: self.transport.volume,
            muted: self.transport.muted,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_modes_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::ModesChanged {
            repeat: self.transport.repeat,
            shuffle: self.transport.shuffle,
        });
    }

    fn emit_error(&mut self, message: String) {
        self.pending_events.push(PlaybackEvent::Error {
            track_id: self.transport.current_track_id.clone(),
            message,
        });
    }
}
