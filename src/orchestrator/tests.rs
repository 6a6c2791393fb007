use super::*;
use crate::config::PlaybackSettings;
use crate::engine::{EngineEvent, EngineState};
use crate::library::Track;
use crate::playlist::Playlist;
use crate::testing::{EngineCall, MockEngine};
use std::time::{Duration, Instant};

const SEC: u64 = 1_000_000_000;

fn uri(i: usize) -> String {
    format!("file:///music/{i}.flac")
}

fn playlist(n: usize) -> Playlist {
    let mut p = Playlist::new();
    for i in 0..n {
        p.append(Track::new(uri(i), Some(format!("T{i}")), None, None, 0));
    }
    p
}

fn orchestrator(flags: PlaybackFlags) -> Orchestrator<MockEngine> {
    Orchestrator::new(MockEngine::new(), flags, &PlaybackSettings::default())
}

fn confirm(o: &mut Orchestrator<MockEngine>, p: &mut Playlist, new: EngineState) {
    o.handle_event(
        p,
        &EngineEvent::StateChanged {
            old: EngineState::Null,
            new,
        },
    );
}

fn current_count(p: &Playlist) -> usize {
    p.tracks().iter().filter(|t| t.is_current()).count()
}

#[test]
fn play_resets_engine_then_loads_and_marks_current() {
    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());

    assert!(o.play_index(&mut p, 1));
    assert_eq!(
        o.engine().calls,
        vec![
            EngineCall::SetState(EngineState::Null),
            EngineCall::SetUri(uri(1)),
            EngineCall::SetState(EngineState::Playing),
        ]
    );
    assert_eq!(o.state(), PlayerState::Loading);
    assert_eq!(o.current_uri(), Some(uri(1).as_str()));
    assert_eq!(p.current_index(), Some(1));
    assert_eq!(p.selected(), Some(1));

    let notices = o.drain_notices();
    assert!(notices.contains(&Notice::TrackChanged(Some(uri(1)))));
    assert!(notices.contains(&Notice::StatusChanged(PlayerState::Loading)));

    confirm(&mut o, &mut p, EngineState::Playing);
    assert_eq!(o.state(), PlayerState::Playing);
}

#[test]
fn play_is_ignored_while_a_switch_is_pending() {
    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());

    assert!(o.play_index(&mut p, 0));
    assert!(!o.play_index(&mut p, 2));
    assert!(!o.play(&mut p, &uri(2)));
    assert_eq!(o.engine().uris_loaded(), vec![uri(0)]);
    assert_eq!(p.selected(), Some(0));

    confirm(&mut o, &mut p, EngineState::Playing);
    assert!(o.play_index(&mut p, 2));
    assert_eq!(o.engine().uris_loaded(), vec![uri(0), uri(2)]);
    assert_eq!(current_count(&p), 1);
}

#[test]
fn next_at_end_stops_unless_looping() {
    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 2);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.engine_mut().calls.clear();

    assert!(!o.next(&mut p));
    assert!(o.engine().calls.is_empty());
    assert_eq!(p.selected(), Some(2));

    o.set_flags(PlaybackFlags {
        loop_all: true,
        ..PlaybackFlags::default()
    });
    assert!(o.next(&mut p));
    assert_eq!(p.selected(), Some(0));
    assert_eq!(o.current_uri(), Some(uri(0).as_str()));
}

#[test]
fn prev_at_start_wraps_only_when_looping() {
    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);

    o.engine_mut().position_ns = Some(SEC);
    assert!(!o.prev(&mut p));
    assert_eq!(p.selected(), Some(0));

    o.set_flags(PlaybackFlags {
        loop_all: true,
        ..PlaybackFlags::default()
    });
    assert!(o.prev(&mut p));
    assert_eq!(p.selected(), Some(2));
}

#[test]
fn next_and_prev_without_selection_pick_the_ends() {
    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());
    assert!(o.next(&mut p));
    assert_eq!(p.selected(), Some(0));

    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());
    assert!(o.prev(&mut p));
    assert_eq!(p.selected(), Some(2));

    let mut empty = Playlist::new();
    assert!(!o.next(&mut empty));
}

#[test]
fn prev_restarts_track_after_threshold() {
    let mut p = playlist(3);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 1);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.engine_mut().calls.clear();

    o.engine_mut().position_ns = Some(5 * SEC);
    assert!(o.prev(&mut p));
    assert_eq!(o.engine().calls, vec![EngineCall::Seek(0)]);
    assert_eq!(p.selected(), Some(1));
    assert_eq!(o.current_uri(), Some(uri(1).as_str()));

    o.engine_mut().position_ns = Some(SEC);
    assert!(o.prev(&mut p));
    assert_eq!(p.selected(), Some(0));
    assert_eq!(o.current_uri(), Some(uri(0).as_str()));
}

#[test]
fn eos_with_repeat_restarts_same_track() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags {
        repeat: true,
        auto_play: true,
        ..PlaybackFlags::default()
    });
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.engine_mut().calls.clear();

    o.handle_event(&mut p, &EngineEvent::Eos);
    assert_eq!(
        o.engine().calls,
        vec![
            EngineCall::Seek(0),
            EngineCall::SetState(EngineState::Playing)
        ]
    );
    assert_eq!(o.current_uri(), Some(uri(0).as_str()));
    assert_eq!(p.current_index(), Some(0));
    assert_eq!(o.state(), PlayerState::Playing);
}

#[test]
fn eos_with_auto_play_advances() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags {
        auto_play: true,
        ..PlaybackFlags::default()
    });
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);

    o.handle_event(&mut p, &EngineEvent::Eos);
    assert_eq!(o.current_uri(), Some(uri(1).as_str()));
    assert_eq!(p.current_index(), Some(1));
    assert_eq!(o.state(), PlayerState::Loading);
    assert_eq!(current_count(&p), 1);

    // end of the last track without looping
    confirm(&mut o, &mut p, EngineState::Playing);
    o.handle_event(&mut p, &EngineEvent::Eos);
    assert_eq!(o.current_uri(), None);
    assert_eq!(o.state(), PlayerState::Stopped);
    assert_eq!(current_count(&p), 0);
}

#[test]
fn eos_without_auto_play_stops() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.drain_notices();

    o.handle_event(&mut p, &EngineEvent::Eos);
    assert_eq!(o.state(), PlayerState::Stopped);
    assert_eq!(o.current_uri(), None);
    assert_eq!(o.engine().state, EngineState::Null);
    assert!(o.drain_notices().contains(&Notice::TrackChanged(None)));
}

#[test]
fn eos_while_loading_is_stale() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags {
        auto_play: true,
        ..PlaybackFlags::default()
    });
    o.play_index(&mut p, 0);
    o.handle_event(&mut p, &EngineEvent::Eos);
    assert_eq!(o.state(), PlayerState::Loading);
    assert_eq!(o.current_uri(), Some(uri(0).as_str()));
    assert_eq!(o.engine().uris_loaded(), vec![uri(0)]);
}

#[test]
fn engine_error_stops_without_retry() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags {
        auto_play: true,
        ..PlaybackFlags::default()
    });
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.drain_notices();

    o.handle_event(&mut p, &EngineEvent::Error("decoder exploded".into()));
    assert_eq!(o.state(), PlayerState::Stopped);
    assert_eq!(o.current_uri(), None);
    assert_eq!(current_count(&p), 0);
    assert_eq!(o.engine().uris_loaded(), vec![uri(0)]);
    let notices = o.drain_notices();
    assert!(notices.contains(&Notice::Error("decoder exploded".into())));
    assert!(notices.contains(&Notice::StatusChanged(PlayerState::Stopped)));
}

#[test]
fn failed_start_clears_switch_guard() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags::default());
    o.engine_mut().fail_play = true;

    assert!(!o.play_index(&mut p, 0));
    assert_eq!(o.state(), PlayerState::Stopped);
    assert!(matches!(o.drain_notices().last(), Some(Notice::Error(_))));

    o.engine_mut().fail_play = false;
    assert!(o.play_index(&mut p, 1));
}

#[test]
fn engine_null_during_switch_is_ignored() {
    let mut p = playlist(1);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Null);
    assert_eq!(o.state(), PlayerState::Loading);

    confirm(&mut o, &mut p, EngineState::Playing);
    confirm(&mut o, &mut p, EngineState::Null);
    assert_eq!(o.state(), PlayerState::Stopped);
}

#[test]
fn seek_needs_known_duration() {
    let mut p = playlist(1);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);
    assert!(!o.seek_fraction(&mut p, 0.5));

    o.engine_mut().duration_ns = Some(10 * SEC);
    o.handle_event(&mut p, &EngineEvent::DurationChanged);
    o.engine_mut().calls.clear();
    assert!(o.seek_fraction(&mut p, 0.5));
    assert!(o.seek_fraction(&mut p, 3.0));
    assert_eq!(
        o.engine().calls,
        vec![EngineCall::Seek(5 * SEC), EngineCall::Seek(10 * SEC)]
    );
    assert!(o.drain_notices().contains(&Notice::Seeked));
}

#[test]
fn unknown_track_duration_is_repaired_once() {
    let mut p = playlist(1);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 0);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.drain_notices();

    o.engine_mut().duration_ns = Some(7 * SEC);
    o.handle_event(&mut p, &EngineEvent::DurationChanged);
    assert_eq!(p.get(0).map(|t| t.duration_ns), Some(7 * SEC));
    assert_eq!(o.duration_ns(), Some(7 * SEC));
    let dirty = |n: &Vec<Notice>| n.iter().filter(|x| **x == Notice::PlaylistDirty).count();
    assert_eq!(dirty(&o.drain_notices()), 1);

    o.handle_event(&mut p, &EngineEvent::DurationChanged);
    assert_eq!(dirty(&o.drain_notices()), 0);
}

#[test]
fn progress_polls_only_while_playing() {
    let mut p = playlist(1);
    let mut o = orchestrator(PlaybackFlags::default());
    o.play_index(&mut p, 0);
    assert!(o.next_deadline().is_none());

    confirm(&mut o, &mut p, EngineState::Playing);
    o.drain_notices();
    o.engine_mut().position_ns = Some(2 * SEC);
    o.engine_mut().duration_ns = Some(9 * SEC);

    let later = Instant::now() + Duration::from_secs(1);
    o.tick(&mut p, later);
    assert_eq!(
        o.drain_notices(),
        vec![
            Notice::PlaylistDirty,
            Notice::Progress {
                position_ns: 2 * SEC,
                duration_ns: Some(9 * SEC)
            }
        ]
    );
    assert!(o.next_deadline().is_some_and(|d| d > later));

    confirm(&mut o, &mut p, EngineState::Paused);
    assert!(o.next_deadline().is_none());
    o.drain_notices();
    o.tick(&mut p, later + Duration::from_secs(5));
    assert!(o.drain_notices().is_empty());
}

#[test]
fn play_pause_toggles_and_starts_from_stopped() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags::default());

    assert!(o.play_pause(&mut p));
    assert_eq!(o.current_uri(), Some(uri(0).as_str()));
    confirm(&mut o, &mut p, EngineState::Playing);

    o.engine_mut().calls.clear();
    assert!(o.play_pause(&mut p));
    assert_eq!(o.engine().calls, vec![EngineCall::SetState(EngineState::Paused)]);
    confirm(&mut o, &mut p, EngineState::Paused);
    assert_eq!(o.state(), PlayerState::Paused);

    assert!(o.play_pause(&mut p));
    confirm(&mut o, &mut p, EngineState::Playing);
    assert_eq!(o.state(), PlayerState::Playing);
    assert!(!o.resume(&mut p));
}

#[test]
fn stop_clears_current_track() {
    let mut p = playlist(2);
    let mut o = orchestrator(PlaybackFlags::default());
    o.stop(&mut p);
    assert_eq!(o.state(), PlayerState::Idle);

    o.play_index(&mut p, 1);
    confirm(&mut o, &mut p, EngineState::Playing);
    o.drain_notices();
    o.stop(&mut p);
    assert_eq!(o.state(), PlayerState::Stopped);
    assert_eq!(current_count(&p), 0);
    assert_eq!(o.position_ns(), None);
    assert_eq!(
        o.drain_notices(),
        vec![
            Notice::TrackChanged(None),
            Notice::StatusChanged(PlayerState::Stopped)
        ]
    );

    assert!(o.play_pause(&mut p));
    assert_eq!(o.current_uri(), Some(uri(1).as_str()));
}
