//! Active-set correctness properties.
//!
//! The incremental delta walk must agree with a brute-force recomputation
//! from scratch at every clock position, and a seek must land the track in
//! exactly the state a fresh track reaches when advanced straight to the
//! seek target.

use proptest::prelude::*;
use vtt_core::cue::{Cue, CueKind, CueSettings, RunId};
use vtt_track::CueTrack;

fn make_cue(start_ms: i64, end_ms: i64) -> Cue {
    Cue {
        id: None,
        start_ms,
        end_ms,
        settings: CueSettings::default(),
        text: format!("{start_ms}-{end_ms}"),
        kind: CueKind::Simple,
    }
}

fn windows(track: &CueTrack) -> Vec<(i64, i64)> {
    let mut windows: Vec<(i64, i64)> = track
        .active_cues()
        .iter()
        .map(|a| (a.cue.start_ms, a.cue.end_ms))
        .collect();
    windows.sort_unstable();
    windows
}

fn brute_force(cues: &[(i64, i64)], time_ms: i64) -> Vec<(i64, i64)> {
    let mut expected: Vec<(i64, i64)> = cues
        .iter()
        .copied()
        .filter(|&(start, end)| start <= time_ms && time_ms < end)
        .collect();
    expected.sort_unstable();
    expected
}

proptest! {
    #[test]
    fn incremental_walk_matches_brute_force(
        spans in prop::collection::vec((0i64..500, 1i64..200), 1..40),
        times in prop::collection::btree_set(0i64..800, 1..30),
    ) {
        let cues: Vec<(i64, i64)> = spans
            .iter()
            .map(|&(start, duration)| (start, start + duration))
            .collect();

        let track = CueTrack::new();
        for &(start, end) in &cues {
            prop_assert!(track.add_cue(make_cue(start, end), RunId(7)));
        }

        // BTreeSet iteration is ascending, so times are strictly increasing
        for &t in &times {
            track.on_clock_advance(t);
            prop_assert_eq!(windows(&track), brute_force(&cues, t), "at t={}", t);
        }
    }

    #[test]
    fn seek_matches_fresh_track(
        spans in prop::collection::vec((0i64..500, 1i64..200), 1..30),
        history in prop::collection::vec(0i64..800, 0..10),
        target in 0i64..800,
    ) {
        let cues: Vec<(i64, i64)> = spans
            .iter()
            .map(|&(start, duration)| (start, start + duration))
            .collect();

        let seasoned = CueTrack::new();
        for &(start, end) in &cues {
            seasoned.add_cue(make_cue(start, end), RunId(3));
        }
        // Arbitrary prior clock history, including backward movements
        for &t in &history {
            seasoned.on_clock_advance(t);
        }
        seasoned.on_seek(target);

        let fresh = CueTrack::new();
        for &(start, end) in &cues {
            fresh.add_cue(make_cue(start, end), RunId(3));
        }
        fresh.on_clock_advance(target);

        prop_assert_eq!(windows(&seasoned), windows(&fresh));
    }

    #[test]
    fn rebuild_is_idempotent(
        spans in prop::collection::vec((0i64..500, 1i64..200), 1..30),
        target in 0i64..800,
    ) {
        let track = CueTrack::new();
        for &(start, duration) in &spans {
            track.add_cue(make_cue(start, start + duration), RunId(3));
        }

        track.on_seek(target);
        let first = windows(&track);
        track.on_seek(target);
        prop_assert_eq!(windows(&track), first);
    }
}

#[test]
fn backward_advance_triggers_implicit_rebuild() {
    let track = CueTrack::new();
    track.add_cue(make_cue(0, 100), RunId(1));
    track.add_cue(make_cue(200, 300), RunId(1));

    track.on_clock_advance(250);
    assert_eq!(windows(&track), vec![(200, 300)]);

    // Time regression without an explicit seek must still rebuild
    track.on_clock_advance(50);
    assert_eq!(windows(&track), vec![(0, 100)]);
}

#[test]
fn boundary_semantics_are_half_open() {
    let track = CueTrack::new();
    track.add_cue(make_cue(10, 20), RunId(1));

    track.on_clock_advance(9);
    assert!(windows(&track).is_empty());

    track.on_clock_advance(10);
    assert_eq!(windows(&track), vec![(10, 20)], "active at its start time");

    track.on_clock_advance(20);
    assert!(windows(&track).is_empty(), "inactive at its end time");
}
