//! Run tracking: bulk discard of decoder-defined cue batches.
//!
//! Each decode unit carries a run id; all cues from the unit share it. A
//! run remembers the latest end time of its members (or an explicit
//! override) and is bucketed by that discard time, so a clock advance
//! sweeps expired runs in one ordered-map walk instead of touching every
//! cue. The sweep is unconditional: a member cue is evicted even when its
//! own end time lies beyond the run's discard time, because the decoder
//! owns batch lifetime, not the individual cue.

use std::collections::BTreeMap;

use ahash::AHashMap;

use vtt_core::cue::RunId;

use crate::arena::{CueArena, CueHandle};
use crate::index::CueEventIndex;

/// One decoder batch of cues
#[derive(Debug)]
struct Run {
    /// Head of the singly-linked cue chain through the arena
    first_cue: Option<CueHandle>,
    /// Current discard time
    end_ms: i64,
    /// Bucket this run currently sits in, if finished
    bucket_ms: Option<i64>,
}

/// Groups cues by run id and buckets runs by discard time.
///
/// Bucketing happens when a run is finished (end of its decode unit) or
/// when its discard time is set explicitly; recording further cues into a
/// bucketed run re-buckets it if its end time grows.
#[derive(Debug, Default)]
pub struct RunTracker {
    runs: AHashMap<u64, Run>,
    /// Discard time -> run ids expiring at that time
    buckets: BTreeMap<i64, Vec<u64>>,
}

impl RunTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live runs
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Register a cue with its run.
    ///
    /// Ephemeral and persistent cues have no run membership and are
    /// skipped. The run is created lazily on its first cue; its end time
    /// extends to cover the cue; the cue is pushed onto the run's chain.
    pub(crate) fn record_cue(&mut self, handle: CueHandle, arena: &mut CueArena) {
        let Some(entry) = arena.get_mut(handle) else {
            debug_assert!(false, "recording a cue that is not in the arena");
            return;
        };
        let run_id = entry.run_id;
        if !run_id.is_tracked() {
            return;
        }
        let cue_end_ms = entry.cue.end_ms;

        let run = self.runs.entry(run_id.0).or_insert(Run {
            first_cue: None,
            end_ms: i64::MIN,
            bucket_ms: None,
        });
        run.end_ms = run.end_ms.max(cue_end_ms);

        entry.next_in_run = run.first_cue;
        entry.in_run_chain = true;
        run.first_cue = Some(handle);

        // A finished run that grew re-buckets under its new end time
        if run.bucket_ms.is_some_and(|b| b != run.end_ms) {
            self.bucket_run(run_id.0);
        }
    }

    /// Bucket the run under its current end time (end of decode unit)
    pub(crate) fn finish(&mut self, run_id: RunId) {
        if !run_id.is_tracked() || !self.runs.contains_key(&run_id.0) {
            return;
        }
        self.bucket_run(run_id.0);
    }

    /// Override the run's discard time and (re)bucket it there.
    ///
    /// An aggressive override below member end times is honored: the sweep
    /// evicts those cues early by design.
    pub(crate) fn set_discard_time(&mut self, run_id: RunId, time_ms: i64) {
        if !run_id.is_tracked() {
            return;
        }
        let Some(run) = self.runs.get_mut(&run_id.0) else {
            return;
        };
        run.end_ms = time_ms;
        self.bucket_run(run_id.0);
    }

    /// Discard every run bucketed at or before `time_ms`.
    ///
    /// Walks each expired run's cue chain, removing the cues from the index
    /// and the arena regardless of their individual end times. Returns the
    /// evicted handles so the caller can prune its active set.
    pub(crate) fn sweep_expired(
        &mut self,
        time_ms: i64,
        index: &mut CueEventIndex,
        arena: &mut CueArena,
    ) -> Vec<CueHandle> {
        let mut evicted = Vec::new();

        while let Some((&bucket_ms, _)) = self.buckets.first_key_value() {
            if bucket_ms > time_ms {
                break;
            }
            let run_ids = self.buckets.remove(&bucket_ms).unwrap_or_default();
            for run_id in run_ids {
                let Some(run) = self.runs.remove(&run_id) else {
                    debug_assert!(false, "bucketed run {run_id} is not tracked");
                    continue;
                };
                let mut cursor = run.first_cue;
                while let Some(handle) = cursor {
                    let Some(entry) = arena.get(handle) else {
                        debug_assert!(false, "run chain references a freed cue");
                        break;
                    };
                    cursor = entry.next_in_run;
                    let cue = entry.cue.clone();
                    index.remove(handle, &cue);
                    arena.release_from_run(handle);
                    arena.release_from_index(handle);
                    evicted.push(handle);
                }
            }
        }

        if !evicted.is_empty() {
            log::debug!(
                "run sweep at {time_ms}ms evicted {} cue(s), {} run(s) remain",
                evicted.len(),
                self.runs.len()
            );
        }
        evicted
    }

    /// Drop all runs and buckets without touching cues
    pub(crate) fn clear(&mut self) {
        self.runs.clear();
        self.buckets.clear();
    }

    /// Move the run into the bucket matching its end time, unlinking it
    /// from any previous bucket first
    fn bucket_run(&mut self, run_id: u64) {
        let Some(run) = self.runs.get_mut(&run_id) else {
            return;
        };
        let end_ms = run.end_ms;
        let previous = run.bucket_ms.replace(end_ms);

        if let Some(previous_ms) = previous {
            if previous_ms == end_ms {
                return;
            }
            if let Some(bucket) = self.buckets.get_mut(&previous_ms) {
                bucket.retain(|&id| id != run_id);
                if bucket.is_empty() {
                    self.buckets.remove(&previous_ms);
                }
            }
        }
        self.buckets.entry(end_ms).or_default().push(run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vtt_core::cue::{Cue, CueKind, CueSettings};

    fn insert_cue(
        arena: &mut CueArena,
        index: &mut CueEventIndex,
        runs: &mut RunTracker,
        start_ms: i64,
        end_ms: i64,
        run_id: RunId,
    ) -> CueHandle {
        let cue = Arc::new(Cue {
            id: None,
            start_ms,
            end_ms,
            settings: CueSettings::default(),
            text: String::new(),
            kind: CueKind::Simple,
        });
        let handle = arena.insert(cue.clone(), run_id);
        index.add(handle, &cue);
        arena.get_mut(handle).unwrap().in_index = true;
        runs.record_cue(handle, arena);
        handle
    }

    #[test]
    fn run_end_extends_to_latest_member() {
        let mut arena = CueArena::new();
        let mut index = CueEventIndex::new();
        let mut runs = RunTracker::new();

        insert_cue(&mut arena, &mut index, &mut runs, 0, 100, RunId(5));
        insert_cue(&mut arena, &mut index, &mut runs, 50, 200, RunId(5));
        runs.finish(RunId(5));

        // Nothing expires before 200
        let evicted = runs.sweep_expired(199, &mut index, &mut arena);
        assert!(evicted.is_empty());
        let evicted = runs.sweep_expired(200, &mut index, &mut arena);
        assert_eq!(evicted.len(), 2);
        assert!(index.is_empty());
        assert!(arena.is_empty());
    }

    #[test]
    fn discard_override_evicts_unexpired_members() {
        let mut arena = CueArena::new();
        let mut index = CueEventIndex::new();
        let mut runs = RunTracker::new();

        let a = insert_cue(&mut arena, &mut index, &mut runs, 0, 100, RunId(5));
        let b = insert_cue(&mut arena, &mut index, &mut runs, 50, 200, RunId(5));
        runs.set_discard_time(RunId(5), 120);

        let evicted = runs.sweep_expired(130, &mut index, &mut arena);
        assert_eq!(evicted.len(), 2);
        // B evicted despite end time 200 > 130
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn ephemeral_and_persistent_cues_are_not_tracked() {
        let mut arena = CueArena::new();
        let mut index = CueEventIndex::new();
        let mut runs = RunTracker::new();

        insert_cue(&mut arena, &mut index, &mut runs, 0, 10, RunId::EPHEMERAL);
        insert_cue(&mut arena, &mut index, &mut runs, 0, 10, RunId::PERSISTENT);
        assert_eq!(runs.run_count(), 0);
        runs.finish(RunId::EPHEMERAL);
        runs.finish(RunId::PERSISTENT);
        assert!(runs.sweep_expired(1000, &mut index, &mut arena).is_empty());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn rebucketing_unlinks_from_previous_bucket() {
        let mut arena = CueArena::new();
        let mut index = CueEventIndex::new();
        let mut runs = RunTracker::new();

        insert_cue(&mut arena, &mut index, &mut runs, 0, 100, RunId(7));
        runs.finish(RunId(7));
        runs.set_discard_time(RunId(7), 500);

        // The old 100ms bucket must be gone, not just shadowed
        let evicted = runs.sweep_expired(400, &mut index, &mut arena);
        assert!(evicted.is_empty());
        assert_eq!(runs.run_count(), 1);

        let evicted = runs.sweep_expired(500, &mut index, &mut arena);
        assert_eq!(evicted.len(), 1);
        assert_eq!(runs.run_count(), 0);
    }

    #[test]
    fn growing_a_finished_run_rebuckets_it() {
        let mut arena = CueArena::new();
        let mut index = CueEventIndex::new();
        let mut runs = RunTracker::new();

        insert_cue(&mut arena, &mut index, &mut runs, 0, 100, RunId(9));
        runs.finish(RunId(9));
        insert_cue(&mut arena, &mut index, &mut runs, 0, 300, RunId(9));

        let evicted = runs.sweep_expired(100, &mut index, &mut arena);
        assert!(evicted.is_empty(), "run must now expire at 300, not 100");
        let evicted = runs.sweep_expired(300, &mut index, &mut arena);
        assert_eq!(evicted.len(), 2);
    }
}
