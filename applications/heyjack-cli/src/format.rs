//! Display formatting for times and player status

use heyjack_playback::{PlaybackStatus, PlayerSnapshot, RepeatMode};

/// Playhead time as `m:ss`, `0:00` when not a positive number
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Track length as `h:mm:ss` or `m:ss`, `--:--` when unknown
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "--:--".to_string();
    }
    let total = seconds as u64;
    let (hours, mins, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

fn status_label(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Idle => "idle",
        PlaybackStatus::Loading => "loading",
        PlaybackStatus::Playing => "playing",
        PlaybackStatus::Paused => "paused",
        PlaybackStatus::Ended => "ended",
        PlaybackStatus::Errored => "error",
    }
}

fn repeat_label(repeat: RepeatMode) -> &'static str {
    match repeat {
        RepeatMode::Off => "off",
        RepeatMode::All => "all",
        RepeatMode::One => "one",
    }
}

/// One-line summary of a snapshot
pub fn status_line(snapshot: &PlayerSnapshot) -> String {
    let transport = &snapshot.transport;
    let track = snapshot.current_track.as_ref().map_or_else(
        || "(no track)".to_string(),
        |t| format!("{} - {}", t.artist, t.title),
    );
    let position = match snapshot.cursor {
        Some(cursor) => format!("{}/{}", cursor + 1, snapshot.queue_len),
        None => "-/0".to_string(),
    };
    let volume = if transport.muted {
        "muted".to_string()
    } else {
        format!("{:.0}%", transport.volume * 100.0)
    };

    let mut line = format!(
        "[{}] {} {} {} / {} vol {} repeat {} shuffle {}",
        status_label(snapshot.status),
        position,
        track,
        format_time(transport.position),
        format_duration(transport.duration),
        volume,
        repeat_label(transport.repeat),
        if transport.shuffle { "on" } else { "off" },
    );
    if let Some(error) = &snapshot.last_error {
        line.push_str(&format!(" ({error})"));
    }
    line
}
