//! Scripted transport intents
//!
//! A script is a comma or whitespace separated list of steps, applied in
//! order to a running player:
//!
//! ```text
//! play, wait:2.5, seek:30, next, status, volume:0.4, mute, repeat:all, shuffle, prev, pause
//! ```

use crate::error::{CliError, Result};
use crate::format::status_line;
use heyjack_playback::{PlayerHandle, RepeatMode};
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Seek(f64),
    Volume(f32),
    Mute,
    /// `None` steps through off -> all -> one
    Repeat(Option<RepeatMode>),
    Shuffle,
    Wait(Duration),
    Status,
}

impl FromStr for Step {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| CliError::Script {
            step: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };

        let step = match (name.to_ascii_lowercase().as_str(), arg) {
            ("play", None) => Step::Play,
            ("pause", None) => Step::Pause,
            ("toggle", None) => Step::Toggle,
            ("next", None) => Step::Next,
            ("prev" | "previous", None) => Step::Previous,
            ("mute", None) => Step::Mute,
            ("shuffle", None) => Step::Shuffle,
            ("status", None) => Step::Status,
            ("repeat", None) => Step::Repeat(None),
            ("repeat", Some(mode)) => Step::Repeat(Some(
                mode.parse().map_err(|_| invalid("expected off, all or one"))?,
            )),
            ("seek", Some(secs)) => Step::Seek(
                secs.parse()
                    .map_err(|_| invalid("expected seconds"))?,
            ),
            ("volume", Some(level)) => Step::Volume(
                level
                    .parse()
                    .map_err(|_| invalid("expected a level between 0 and 1"))?,
            ),
            ("wait", Some(secs)) => {
                let secs: f64 = secs.parse().map_err(|_| invalid("expected seconds"))?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(invalid("wait must be a non-negative number"));
                }
                Step::Wait(Duration::from_secs_f64(secs))
            }
            ("seek" | "volume" | "wait", None) => return Err(invalid("missing argument")),
            (_, Some(_)) if is_bare(name) => return Err(invalid("takes no argument")),
            _ => return Err(invalid("unknown step")),
        };
        Ok(step)
    }
}

fn is_bare(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "play" | "pause" | "toggle" | "next" | "prev" | "previous" | "mute" | "shuffle" | "status"
    )
}

/// Parse a whole script
pub fn parse_script(script: &str) -> Result<Vec<Step>> {
    script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|step| !step.is_empty())
        .map(str::parse)
        .collect()
}

/// Apply `steps` to `player`, writing a status line for each `status` step
pub async fn run_script(player: &PlayerHandle, steps: &[Step], out: &mut impl Write) -> Result<()> {
    for step in steps {
        debug!(?step, "applying script step");
        match step {
            Step::Play => player.play()?,
            Step::Pause => player.pause()?,
            Step::Toggle => player.play_pause()?,
            Step::Next => player.next()?,
            Step::Previous => player.previous()?,
            Step::Seek(secs) => player.seek(*secs)?,
            Step::Volume(level) => player.set_volume(*level)?,
            Step::Mute => player.toggle_mute()?,
            Step::Repeat(Some(mode)) => player.set_repeat_mode(*mode)?,
            Step::Repeat(None) => player.cycle_repeat_mode()?,
            Step::Shuffle => player.toggle_shuffle()?,
            Step::Wait(duration) => tokio::time::sleep(*duration).await,
            Step::Status => {
                // Round-trip through the service so earlier steps have applied
                player.session().await?;
                writeln!(out, "{}", status_line(&player.snapshot()))?;
            }
        }
    }
    Ok(())
}
