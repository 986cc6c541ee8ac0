//! Position sampler
//!
//! A background interval task that asks the player service to mirror the
//! backend's elapsed time into the transport. It only ticks; the engine does
//! the reading, so a sampler never touches state directly.
//!
//! The task lives exactly as long as its [`SamplerGuard`]. Each tick carries
//! the play session it was started for, and the engine ignores ticks from any
//! other session, so a tick already queued when playback stops is harmless.

use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Spawner for sampling tasks
pub struct PositionSampler;

impl PositionSampler {
    /// Start ticking `session` into `ticks` every `period`
    ///
    /// Ticks are dropped rather than queued when the receiver lags. The task
    /// stops when the guard is dropped or the receiver is closed.
    pub fn spawn(session: u64, period: Duration, ticks: mpsc::Sender<u64>) -> SamplerGuard {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                match ticks.try_send(session) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            trace!(session, "sampler receiver closed");
        });

        trace!(session, ?period, "sampler started");
        SamplerGuard { session, handle }
    }
}

/// Owns a running sampler; dropping it cancels the task
#[derive(Debug)]
pub struct SamplerGuard {
    session: u64,
    handle: JoinHandle<()>,
}

impl SamplerGuard {
    /// Play session this sampler ticks for
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SamplerGuard {
    fn drop(&mut self) {
        self.handle.abort();
        trace!(session = self.session, "sampler stopped");
    }
}
