//! Player service - the serialization point
//!
//! One tokio task owns the [`PlaybackEngine`] and applies, strictly one at a
//! time, user intents from any number of [`PlayerHandle`]s, events from the
//! audio backend and ticks from the position sampler. After each message the
//! task starts or stops the sampler to match the engine's play session and
//! publishes a fresh snapshot plus any recorded events.
//!
//! ```text
//!   PlayerHandle ──commands──┐
//!   AudioBackend ──events────┼──► service task ──► watch<PlayerSnapshot>
//!   PositionSampler ─ticks───┘        │        └─► broadcast<PlaybackEvent>
//!                                     ▼
//!                              PlaybackEngine
//! ```

use crate::{
    backend::{AudioBackend, BackendEventReceiver},
    engine::{PlaybackEngine, PlayerSnapshot},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    sampler::{PositionSampler, SamplerGuard},
    session::PersistedSession,
    types::RepeatMode,
};
use heyjack_core::Track;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

enum Command {
    LoadQueue {
        tracks: Vec<Track>,
        start_index: usize,
        autoplay: bool,
        reply: oneshot::Sender<Result<()>>,
    },
    Play,
    Pause,
    PlayPause,
    Next,
    Previous,
    Seek(f64),
    SetVolume(f32),
    ToggleMute,
    SetRepeat(RepeatMode),
    CycleRepeat,
    ToggleShuffle,
    Session(oneshot::Sender<PersistedSession>),
    Shutdown,
}

/// Handle to a running player service
///
/// Cheap to clone. Intents are fire-and-forget: they only fail when the
/// service has stopped. Outcomes are observed through [`subscribe`] and
/// [`events`].
///
/// [`subscribe`]: PlayerHandle::subscribe
/// [`events`]: PlayerHandle::events
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerHandle {
    /// Move `engine` into a new service task
    ///
    /// `backend_events` must be the receiving half of the channel the
    /// engine's backend reports through. Fails if the engine's configuration
    /// does not validate.
    pub fn spawn<B>(
        engine: PlaybackEngine<B>,
        backend_events: BackendEventReceiver,
    ) -> Result<(Self, JoinHandle<()>)>
    where
        B: AudioBackend + 'static,
    {
        engine.config().validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (event_tx, _) = broadcast::channel(engine.config().event_capacity);
        let (tick_tx, tick_rx) = mpsc::channel(1);

        let service = PlayerService {
            sample_interval: engine.config().sample_interval(),
            engine,
            commands: command_rx,
            backend_events,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
            sampler: None,
            tick_tx,
            tick_rx,
        };
        let task = tokio::spawn(service.run());

        Ok((
            Self {
                commands: command_tx,
                snapshots: snapshot_rx,
                events: event_tx,
            },
            task,
        ))
    }

    /// Replace the queue, keeping the play/pause intent
    pub async fn load_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.replace_queue(tracks, start_index, false).await
    }

    /// Replace the queue and start playing
    pub async fn play_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.replace_queue(tracks, start_index, true).await
    }

    async fn replace_queue(&self, tracks: Vec<Track>, start_index: usize, autoplay: bool) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::LoadQueue {
            tracks,
            start_index,
            autoplay,
            reply,
        })?;
        response.await.map_err(|_| PlaybackError::ServiceStopped)?
    }

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn play_pause(&self) -> Result<()> {
        self.send(Command::PlayPause)
    }

    pub fn next(&self) -> Result<()> {
        self.send(Command::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(Command::Previous)
    }

    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.send(Command::Seek(seconds))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(Command::SetVolume(volume))
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(Command::ToggleMute)
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.send(Command::SetRepeat(mode))
    }

    pub fn cycle_repeat_mode(&self) -> Result<()> {
        self.send(Command::CycleRepeat)
    }

    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(Command::ToggleShuffle)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch snapshots as they change
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    /// Receive playback events published from now on
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Session to persist, taken after every earlier intent has applied
    pub async fn session(&self) -> Result<PersistedSession> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Session(reply))?;
        response.await.map_err(|_| PlaybackError::ServiceStopped)
    }

    /// Ask the service to stop
    ///
    /// Intents sent earlier are still applied. Await the service's
    /// `JoinHandle` to wait for it to finish.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ServiceStopped)
    }
}

struct PlayerService<B: AudioBackend> {
    engine: PlaybackEngine<B>,
    commands: mpsc::UnboundedReceiver<Command>,
    backend_events: BackendEventReceiver,
    snapshots: watch::Sender<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
    sample_interval: Duration,

    /// Running while the engine is playing
    sampler: Option<SamplerGuard>,
    tick_tx: mpsc::Sender<u64>,
    tick_rx: mpsc::Receiver<u64>,
}

impl<B: AudioBackend> PlayerService<B> {
    async fn run(mut self) {
        info!("player service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                Some(event) = self.backend_events.recv() => {
                    self.engine.handle_backend_event(event);
                }
                Some(session) = self.tick_rx.recv() => {
                    self.engine.sample_position(session);
                }
            }

            self.reconcile_sampler();
            self.publish();
        }

        self.sampler = None;
        self.engine.shutdown();
        self.publish();
        info!("player service stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::LoadQueue {
                tracks,
                start_index,
                autoplay,
                reply,
            } => {
                let result = if autoplay {
                    self.engine.play_queue(tracks, start_index)
                } else {
                    self.engine.load_queue(tracks, start_index)
                };
                if let Err(e) = &result {
                    warn!(error = %e, "queue load rejected");
                }
                let _ = reply.send(result);
            }
            Command::Play => self.engine.play(),
            Command::Pause => self.engine.pause(),
            Command::PlayPause => self.engine.play_pause(),
            Command::Next => self.engine.next(),
            Command::Previous => self.engine.previous(),
            Command::Seek(seconds) => self.engine.seek(seconds),
            Command::SetVolume(volume) => self.engine.set_volume(volume),
            Command::ToggleMute => self.engine.toggle_mute(),
            Command::SetRepeat(mode) => self.engine.set_repeat_mode(mode),
            Command::CycleRepeat => self.engine.cycle_repeat_mode(),
            Command::ToggleShuffle => self.engine.toggle_shuffle(),
            Command::Session(reply) => {
                let _ = reply.send(self.engine.session());
            }
            // Handled by the run loop
            Command::Shutdown => {}
        }
    }

    /// Keep exactly one sampler alive for the current play session
    fn reconcile_sampler(&mut self) {
        let running = self.sampler.as_ref().map(SamplerGuard::session);
        match self.engine.play_session() {
            Some(session) if running == Some(session) => {}
            Some(session) => {
                // Replacing the guard cancels the previous session's task
                self.sampler = Some(PositionSampler::spawn(
                    session,
                    self.sample_interval,
                    self.tick_tx.clone(),
                ));
            }
            None => {
                if self.sampler.take().is_some() {
                    debug!("playback left playing state, sampler cancelled");
                }
            }
        }
    }

    fn publish(&mut self) {
        let snapshot = self.engine.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        for event in self.engine.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}
