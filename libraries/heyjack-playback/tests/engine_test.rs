//! State machine tests for PlaybackEngine
//!
//! Drives the engine directly with a recording backend and hand-delivered
//! backend events, covering:
//! - Queue loading and cursor/transport agreement
//! - Natural end of track under every repeat mode
//! - Next/previous, including the restart threshold
//! - Volume and seek clamping
//! - Stale load suppression
//! - Error handling and recovery
//! - Session restore validation

use heyjack_core::{Track, TrackId};
use heyjack_playback::{
    AudioBackend, BackendEvent, LoadId, PersistedSession, PlaybackConfig, PlaybackEngine,
    PlaybackError, PlaybackEvent, PlaybackStatus, RepeatMode,
};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(LoadId, PathBuf),
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
}

/// Backend that records every command and reports a settable elapsed time
#[derive(Default)]
struct RecordingBackend {
    calls: Vec<Call>,
    elapsed: Cell<f64>,
}

impl RecordingBackend {
    fn last_load(&self) -> LoadId {
        self.calls
            .iter()
            .rev()
            .find_map(|call| match call {
                Call::Load(load, _) => Some(*load),
                _ => None,
            })
            .expect("no load issued")
    }

    fn load_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Load(..)))
            .count()
    }

    fn set_elapsed(&self, secs: f64) {
        self.elapsed.set(secs);
    }
}

impl AudioBackend for RecordingBackend {
    fn load(&mut self, load: LoadId, path: &Path) {
        self.elapsed.set(0.0);
        self.calls.push(Call::Load(load, path.to_path_buf()));
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn seek(&mut self, position: f64) {
        self.elapsed.set(position);
        self.calls.push(Call::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::Volume(volume));
    }

    fn elapsed(&self) -> f64 {
        self.elapsed.get()
    }
}

fn create_test_track(id: &str) -> Track {
    Track::new(TrackId::new(id), format!("/music/{id}.mp3"), format!("Track {id}"))
        .with_duration(Duration::from_secs(200))
}

fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| create_test_track(id)).collect()
}

fn engine() -> PlaybackEngine<RecordingBackend> {
    let config = PlaybackConfig {
        shuffle_seed: Some(7),
        ..PlaybackConfig::default()
    };
    PlaybackEngine::new(RecordingBackend::default(), config)
}

fn complete_load(engine: &mut PlaybackEngine<RecordingBackend>, duration: f64) {
    let load = engine.backend().last_load();
    engine.handle_backend_event(BackendEvent::Loaded { load, duration });
}

fn end_track(engine: &mut PlaybackEngine<RecordingBackend>) {
    let load = engine.backend().last_load();
    engine.handle_backend_event(BackendEvent::Ended { load });
}

fn fail_track(engine: &mut PlaybackEngine<RecordingBackend>, reason: &str) {
    let load = engine.backend().last_load();
    engine.handle_backend_event(BackendEvent::Error {
        load,
        reason: reason.to_string(),
    });
}

/// Playing engine over `ids`, positioned at `start`
fn playing(ids: &[&str], start: usize) -> PlaybackEngine<RecordingBackend> {
    let mut engine = engine();
    engine.play_queue(tracks(ids), start).unwrap();
    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    engine
}

fn current_id(engine: &PlaybackEngine<RecordingBackend>) -> Option<&str> {
    engine.transport().current_track_id.as_ref().map(TrackId::as_str)
}

fn assert_cursor_agrees(engine: &PlaybackEngine<RecordingBackend>) {
    assert_eq!(
        engine.current_track().map(|t| &t.id),
        engine.transport().current_track_id.as_ref()
    );
}

// ============================================================================
// Queue loading
// ============================================================================

#[test]
fn load_queue_selects_start_track() {
    let list = tracks(&["a", "b", "c"]);
    for (index, expected) in list.iter().enumerate() {
        let mut engine = engine();
        engine.load_queue(list.clone(), index).unwrap();

        assert_eq!(engine.current_track(), Some(expected));
        assert_eq!(engine.transport().current_track_id.as_ref(), Some(&expected.id));
        assert_eq!(engine.status(), PlaybackStatus::Loading);
        assert!(!engine.transport().playing);
    }
}

#[test]
fn rejected_load_leaves_state_untouched() {
    let mut engine = playing(&["a", "b"], 1);

    let err = engine.load_queue(tracks(&["x", "y"]), 5).unwrap_err();
    assert_eq!(err, PlaybackError::InvalidIndex { index: 5, len: 2 });

    let err = engine.load_queue(tracks(&["x", "x"]), 0).unwrap_err();
    assert_eq!(err, PlaybackError::DuplicateTrack(TrackId::new("x")));

    assert_eq!(current_id(&engine), Some("b"));
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn empty_load_clears_and_stops() {
    let mut engine = playing(&["a", "b"], 0);
    let stale = engine.backend().last_load();

    engine.load_queue(Vec::new(), 3).unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Idle);
    assert!(engine.current_track().is_none());
    assert!(engine.transport().current_track_id.is_none());
    assert!(!engine.transport().playing);

    // A late event from the cleared queue changes nothing
    engine.handle_backend_event(BackendEvent::Ended { load: stale });
    assert_eq!(engine.status(), PlaybackStatus::Idle);
}

#[test]
fn load_queue_keeps_playing_intent() {
    let mut engine = playing(&["a"], 0);

    engine.load_queue(tracks(&["x", "y"]), 1).unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert!(engine.transport().playing);

    complete_load(&mut engine, 120.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(current_id(&engine), Some("y"));
}

#[test]
fn loaded_without_autoplay_pauses() {
    let mut engine = engine();
    engine.load_queue(tracks(&["a"]), 0).unwrap();

    complete_load(&mut engine, 90.0);
    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert_eq!(engine.transport().duration, 90.0);
    assert!(!engine.backend().calls.contains(&Call::Play));
}

#[test]
fn unknown_backend_duration_keeps_library_duration() {
    let mut engine = engine();
    engine.play_queue(tracks(&["a"]), 0).unwrap();

    complete_load(&mut engine, f64::NAN);
    assert_eq!(engine.transport().duration, 200.0);
}

// ============================================================================
// Natural end of track
// ============================================================================

#[test]
fn end_of_last_track_without_repeat_stops() {
    let mut engine = playing(&["a", "b", "c"], 2);

    end_track(&mut engine);

    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert!(!engine.transport().playing);
    assert_eq!(current_id(&engine), Some("c"));
    assert_eq!(engine.queue().cursor(), Some(2));
    assert_eq!(engine.transport().position, engine.transport().duration);
    assert_eq!(engine.backend().load_count(), 1);
    assert_eq!(engine.backend().calls.last(), Some(&Call::Pause));
}

#[test]
fn end_event_while_paused_is_ignored() {
    let mut engine = playing(&["a", "b"], 0);
    engine.backend().set_elapsed(42.0);
    engine.pause();
    engine.drain_events();

    end_track(&mut engine);

    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert_eq!(current_id(&engine), Some("a"));
    assert_eq!(engine.transport().position, 42.0);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn second_end_after_queue_finished_is_ignored() {
    let mut engine = playing(&["a"], 0);
    end_track(&mut engine);
    engine.seek(20.0);
    engine.drain_events();

    end_track(&mut engine);

    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert_eq!(engine.transport().position, 20.0);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn end_of_track_advances_and_autoplays() {
    let mut engine = playing(&["a", "b"], 0);

    end_track(&mut engine);
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert!(engine.transport().playing);
    assert_eq!(current_id(&engine), Some("b"));
    assert_cursor_agrees(&engine);

    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn repeat_one_replays_same_track() {
    let mut engine = playing(&["a"], 0);
    engine.set_repeat_mode(RepeatMode::One);
    engine.backend().set_elapsed(200.0);

    end_track(&mut engine);

    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert!(engine.transport().playing);
    assert_eq!(engine.transport().position, 0.0);
    assert_eq!(engine.queue().cursor(), Some(0));
    assert_eq!(engine.backend().load_count(), 1);

    let tail = &engine.backend().calls[engine.backend().calls.len() - 2..];
    assert_eq!(tail, &[Call::Seek(0.0), Call::Play]);
}

#[test]
fn repeat_all_wraps_at_end() {
    let mut engine = playing(&["a", "b"], 1);
    engine.set_repeat_mode(RepeatMode::All);

    end_track(&mut engine);
    assert_eq!(current_id(&engine), Some("a"));
    assert_eq!(engine.queue().cursor(), Some(0));
    assert!(engine.transport().playing);
}

#[test]
fn play_after_end_of_queue_restarts_track() {
    let mut engine = playing(&["a"], 0);
    end_track(&mut engine);
    assert_eq!(engine.status(), PlaybackStatus::Paused);

    engine.play();
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.transport().position, 0.0);
    assert_eq!(engine.backend().elapsed(), 0.0);
}

#[test]
fn end_event_emits_track_ended() {
    let mut engine = playing(&["a", "b"], 0);
    engine.drain_events();

    end_track(&mut engine);
    let events = engine.drain_events();
    assert!(events.contains(&PlaybackEvent::TrackEnded {
        track_id: TrackId::new("a")
    }));
    assert!(events.contains(&PlaybackEvent::TrackChanged {
        track_id: TrackId::new("b"),
        previous_track_id: Some(TrackId::new("a")),
    }));
}

// ============================================================================
// Next / previous
// ============================================================================

#[test]
fn next_at_end_without_repeat_is_noop() {
    let mut engine = playing(&["a", "b"], 1);

    for _ in 0..3 {
        engine.next();
        assert_eq!(engine.queue().cursor(), Some(1));
        assert_eq!(engine.status(), PlaybackStatus::Playing);
    }
    assert_eq!(engine.backend().load_count(), 1);
}

#[test]
fn next_keeps_pause_state() {
    let mut engine = playing(&["a", "b"], 0);
    engine.pause();

    engine.next();
    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert_eq!(current_id(&engine), Some("b"));
}

#[test]
fn previous_past_threshold_restarts_track() {
    let mut engine = playing(&["a", "b", "c"], 1);
    engine.backend().set_elapsed(5.0);

    engine.previous();

    assert_eq!(engine.queue().cursor(), Some(1));
    assert_eq!(engine.transport().position, 0.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.backend().calls.last(), Some(&Call::Seek(0.0)));
}

#[test]
fn invalid_restart_threshold_falls_back_to_default() {
    let config = PlaybackConfig {
        restart_threshold_secs: f64::NAN,
        ..PlaybackConfig::default()
    };
    let mut engine = PlaybackEngine::new(RecordingBackend::default(), config);
    engine.play_queue(tracks(&["a", "b"]), 1).unwrap();
    complete_load(&mut engine, 200.0);
    engine.backend().set_elapsed(5.0);

    engine.previous();

    assert_eq!(engine.queue().cursor(), Some(1));
    assert_eq!(engine.transport().position, 0.0);
}

#[test]
fn previous_within_threshold_moves_back() {
    let mut engine = playing(&["a", "b", "c"], 1);
    engine.backend().set_elapsed(1.0);

    engine.previous();
    assert_eq!(engine.queue().cursor(), Some(0));
    assert_eq!(current_id(&engine), Some("a"));
    assert!(engine.transport().playing);
}

#[test]
fn previous_wraps_from_first_track() {
    let mut engine = playing(&["a", "b", "c"], 0);
    engine.backend().set_elapsed(1.0);

    engine.previous();
    assert_eq!(engine.queue().cursor(), Some(2));
    assert_cursor_agrees(&engine);
}

#[test]
fn previous_uses_paused_position() {
    let mut engine = playing(&["a", "b"], 1);
    engine.pause();
    engine.seek(5.0);

    engine.previous();
    assert_eq!(engine.queue().cursor(), Some(1));
    assert_eq!(engine.transport().position, 0.0);
}

#[test]
fn shuffled_next_never_repeats_current() {
    let mut engine = playing(&["a", "b", "c", "d", "e"], 0);
    engine.toggle_shuffle();

    for _ in 0..50 {
        let before = engine.queue().cursor();
        engine.next();
        assert_ne!(engine.queue().cursor(), before);
        assert_cursor_agrees(&engine);
        complete_load(&mut engine, 200.0);
    }
}

#[test]
fn operations_on_empty_queue_are_noops() {
    let mut engine = engine();

    engine.play();
    engine.next();
    engine.previous();
    engine.seek(10.0);

    assert_eq!(engine.status(), PlaybackStatus::Idle);
    assert_eq!(engine.backend().calls, vec![Call::Volume(0.8)]);
}

// ============================================================================
// Seek and volume
// ============================================================================

#[test]
fn seek_clamps_to_duration() {
    let mut engine = playing(&["a"], 0);

    engine.seek(210.0);
    assert_eq!(engine.transport().position, 200.0);
    assert_eq!(engine.backend().calls.last(), Some(&Call::Seek(200.0)));

    engine.seek(-3.0);
    assert_eq!(engine.transport().position, 0.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn seek_during_loading_applies_on_load() {
    let mut engine = engine();
    engine.play_queue(tracks(&["a"]), 0).unwrap();

    engine.seek(42.0);
    assert!(!engine.backend().calls.contains(&Call::Seek(42.0)));

    complete_load(&mut engine, 200.0);
    assert_eq!(engine.transport().position, 42.0);
    assert!(engine.backend().calls.contains(&Call::Seek(42.0)));
}

#[test]
fn volume_clamps_and_reaches_backend() {
    let mut engine = engine();

    engine.set_volume(1.5);
    assert_eq!(engine.transport().volume, 1.0);
    assert_eq!(engine.backend().calls.last(), Some(&Call::Volume(1.0)));

    engine.set_volume(-0.2);
    assert_eq!(engine.transport().volume, 0.0);

    engine.set_volume(f32::NAN);
    assert_eq!(engine.transport().volume, 0.0);
}

#[test]
fn mute_silences_backend_and_keeps_level() {
    let mut engine = engine();
    engine.set_volume(0.6);

    engine.toggle_mute();
    assert!(engine.transport().muted);
    assert_eq!(engine.transport().volume, 0.6);
    assert_eq!(engine.backend().calls.last(), Some(&Call::Volume(0.0)));

    engine.toggle_mute();
    assert_eq!(engine.backend().calls.last(), Some(&Call::Volume(0.6)));

    engine.toggle_mute();
    engine.set_volume(0.3);
    assert!(!engine.transport().muted);
    assert_eq!(engine.backend().calls.last(), Some(&Call::Volume(0.3)));
}

#[test]
fn modes_survive_queue_reload() {
    let mut engine = engine();
    engine.set_repeat_mode(RepeatMode::All);
    engine.toggle_shuffle();
    engine.set_volume(0.4);

    engine.load_queue(tracks(&["a", "b"]), 0).unwrap();
    engine.load_queue(tracks(&["c"]), 0).unwrap();

    assert_eq!(engine.transport().repeat, RepeatMode::All);
    assert!(engine.transport().shuffle);
    assert_eq!(engine.transport().volume, 0.4);
}

#[test]
fn repeat_cycles_off_all_one() {
    let mut engine = engine();
    engine.cycle_repeat_mode();
    assert_eq!(engine.transport().repeat, RepeatMode::All);
    engine.cycle_repeat_mode();
    assert_eq!(engine.transport().repeat, RepeatMode::One);
    engine.cycle_repeat_mode();
    assert_eq!(engine.transport().repeat, RepeatMode::Off);
}

// ============================================================================
// Coalescing and stale events
// ============================================================================

#[test]
fn later_load_wins_over_pending_one() {
    let mut engine = engine();
    engine.play_queue(tracks(&["a", "b"]), 0).unwrap();
    let first = engine.backend().last_load();

    engine.next();
    let second = engine.backend().last_load();
    assert!(second > first);

    // Late answer for the superseded load
    engine.handle_backend_event(BackendEvent::Loaded {
        load: first,
        duration: 999.0,
    });
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert_eq!(current_id(&engine), Some("b"));

    engine.handle_backend_event(BackendEvent::Error {
        load: first,
        reason: "late failure".into(),
    });
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert!(engine.last_error().is_none());

    engine.handle_backend_event(BackendEvent::Loaded {
        load: second,
        duration: 150.0,
    });
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.transport().duration, 150.0);
    assert_eq!(current_id(&engine), Some("b"));
}

#[test]
fn play_and_pause_during_loading_set_intent() {
    let mut engine = engine();
    engine.load_queue(tracks(&["a"]), 0).unwrap();

    engine.play();
    assert!(engine.transport().playing);
    assert_eq!(engine.backend().load_count(), 1);

    engine.pause();
    engine.play();
    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn pause_during_loading_wins() {
    let mut engine = engine();
    engine.play_queue(tracks(&["a"]), 0).unwrap();

    engine.pause();
    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Paused);
    assert!(!engine.transport().playing);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn backend_error_keeps_failed_track_and_does_not_advance() {
    let mut engine = playing(&["a", "b"], 0);
    engine.drain_events();

    fail_track(&mut engine, "device unplugged");

    assert_eq!(engine.status(), PlaybackStatus::Errored);
    assert!(!engine.transport().playing);
    assert_eq!(current_id(&engine), Some("a"));
    assert_eq!(engine.queue().cursor(), Some(0));
    assert_eq!(engine.last_error(), Some("device unplugged"));
    assert!(engine.drain_events().contains(&PlaybackEvent::Error {
        track_id: Some(TrackId::new("a")),
        message: "device unplugged".into(),
    }));
}

#[test]
fn load_error_is_recoverable() {
    let mut engine = engine();
    engine.play_queue(tracks(&["bad", "good"]), 0).unwrap();
    fail_track(&mut engine, "unsupported format");
    assert_eq!(engine.status(), PlaybackStatus::Errored);

    engine.next();
    assert_eq!(current_id(&engine), Some("good"));
    assert!(engine.last_error().is_none());

    engine.play();
    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn play_from_errored_retries_load() {
    let mut engine = engine();
    engine.play_queue(tracks(&["a"]), 0).unwrap();
    let first = engine.backend().last_load();
    fail_track(&mut engine, "busy");

    engine.play();
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert!(engine.backend().last_load() > first);

    complete_load(&mut engine, 200.0);
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

// ============================================================================
// Position sampling
// ============================================================================

#[test]
fn samples_apply_only_to_live_session() {
    let mut engine = playing(&["a"], 0);
    let session = engine.play_session().unwrap();

    engine.backend().set_elapsed(12.5);
    assert!(engine.sample_position(session));
    assert_eq!(engine.transport().position, 12.5);

    engine.pause();
    assert_eq!(engine.play_session(), None);
    engine.backend().set_elapsed(30.0);
    assert!(!engine.sample_position(session));
    assert_eq!(engine.transport().position, 12.5);

    engine.play();
    let resumed = engine.play_session().unwrap();
    assert_ne!(resumed, session);
    assert!(!engine.sample_position(session));
}

#[test]
fn samples_are_clamped_to_duration() {
    let mut engine = playing(&["a"], 0);
    let session = engine.play_session().unwrap();

    engine.backend().set_elapsed(500.0);
    engine.sample_position(session);
    assert_eq!(engine.transport().position, 200.0);
}

// ============================================================================
// Session persistence
// ============================================================================

#[test]
fn session_round_trips_settings() {
    let mut engine = playing(&["a", "b", "c"], 1);
    engine.set_volume(0.3);
    engine.set_repeat_mode(RepeatMode::One);

    let session = engine.session();
    assert_eq!(session.cursor, Some(1));
    assert_eq!(session.tracks.len(), 3);

    let restored = PlaybackEngine::restore(
        RecordingBackend::default(),
        PlaybackConfig::default(),
        session,
    );
    assert_eq!(restored.status(), PlaybackStatus::Idle);
    assert_eq!(current_id(&restored), Some("b"));
    assert_eq!(restored.transport().volume, 0.3);
    assert_eq!(restored.transport().repeat, RepeatMode::One);
    assert_eq!(restored.backend().calls.last(), Some(&Call::Volume(0.3)));
}

#[test]
fn restore_validates_untrusted_session() {
    let session = PersistedSession {
        volume: 4.0,
        tracks: tracks(&["a", "b", "a"]),
        cursor: Some(9),
        repeat: RepeatMode::Off,
        shuffle: true,
    };

    let mut engine = PlaybackEngine::restore(
        RecordingBackend::default(),
        PlaybackConfig::default(),
        session,
    );
    assert_eq!(engine.transport().volume, 1.0);
    assert_eq!(engine.queue().len(), 2);
    assert_eq!(engine.queue().cursor(), Some(1));
    assert_cursor_agrees(&engine);

    engine.play();
    assert_eq!(engine.status(), PlaybackStatus::Loading);
    assert_eq!(
        engine.backend().calls.last(),
        Some(&Call::Load(LoadId::new(1), PathBuf::from("/music/b.mp3")))
    );
}
