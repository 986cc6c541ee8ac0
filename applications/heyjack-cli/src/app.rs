//! Player session runner
//!
//! Builds the engine over the simulated backend, restores the saved session,
//! loads the requested queue, plays the script and saves the session again.

use crate::config::AppConfig;
use crate::error::Result;
use crate::script::{run_script, Step};
use crate::session_file::{load_session, save_session};
use heyjack_core::Track;
use heyjack_playback::{
    event_channel, PlaybackEngine, PlayerHandle, PlayerSnapshot, RepeatMode, SimulatedBackend,
};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// What one `play` invocation should do
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Queue to load; empty keeps the restored queue
    pub tracks: Vec<Track>,
    pub start_index: usize,
    pub steps: Vec<Step>,

    /// Overrides applied after the session is restored
    pub volume: Option<f32>,
    pub repeat: Option<RepeatMode>,
    pub shuffle: Option<bool>,
}

/// Run a scripted player session and return the final snapshot
pub async fn run_player(config: &AppConfig, options: PlayOptions, out: &mut impl Write) -> Result<PlayerSnapshot> {
    let (events_tx, events_rx) = event_channel();
    let backend = SimulatedBackend::new(events_tx)
        .with_default_duration(config.backend.default_duration_secs)
        .with_load_latency(Duration::from_millis(config.backend.load_latency_ms));

    let session_path = config.session.path.clone();
    let restored = match &session_path {
        Some(path) => load_session(path)?,
        None => None,
    };
    let engine = match restored {
        Some(session) => PlaybackEngine::restore(backend, config.playback.clone(), session),
        None => PlaybackEngine::new(backend, config.playback.clone()),
    };

    let (player, task) = PlayerHandle::spawn(engine, events_rx)?;
    let mut result = drive(&player, options, out).await;
    if result.is_ok() && config.session.autosave {
        if let Some(path) = &session_path {
            result = autosave(&player, path).await;
        }
    }

    player.shutdown()?;
    if let Err(e) = task.await {
        warn!(error = %e, "player service did not stop cleanly");
    }
    result?;

    let snapshot = player.snapshot();
    info!(status = ?snapshot.status, "player session finished");
    Ok(snapshot)
}

async fn autosave(player: &PlayerHandle, path: &Path) -> Result<()> {
    let session = player.session().await?;
    save_session(path, &session)
}

async fn drive(player: &PlayerHandle, options: PlayOptions, out: &mut impl Write) -> Result<()> {
    if let Some(volume) = options.volume {
        player.set_volume(volume)?;
    }
    if let Some(mode) = options.repeat {
        player.set_repeat_mode(mode)?;
    }
    if let Some(shuffle) = options.shuffle {
        if player.session().await?.shuffle != shuffle {
            player.toggle_shuffle()?;
        }
    }

    if !options.tracks.is_empty() {
        player.load_queue(options.tracks, options.start_index).await?;
    }

    run_script(player, &options.steps, out).await
}
