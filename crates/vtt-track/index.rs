//! Time-ordered index over cue boundary events.
//!
//! Maps each timestamp carrying at least one event to the list of cues with
//! an event there, in insertion order. Every indexed cue contributes exactly
//! one start event and one end event, plus zero or more inner-time events
//! strictly between them; timestamps colliding with the start classify as
//! the start event, and the end event always exists, so a cue indexed here
//! is always eventually removed from the active set.

use std::collections::BTreeMap;
use std::ops::Bound;

use vtt_core::cue::Cue;

use crate::arena::CueHandle;

/// What a timestamp means for a particular cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The cue becomes active at this timestamp
    Start,
    /// Mid-cue timestamp from the cue's inner timeline
    Inner,
    /// The cue stops being active at this timestamp
    End,
}

/// One cue's event at an indexed timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueEvent {
    /// The cue this event belongs to
    pub handle: CueHandle,
    /// Boundary classification
    pub kind: EventKind,
}

/// Sorted mapping from timestamp to the events at that timestamp.
///
/// Buckets keep insertion order, so cues at the same timestamp are visited
/// in the order they were added.
#[derive(Debug, Default)]
pub struct CueEventIndex {
    buckets: BTreeMap<i64, Vec<CueEvent>>,
}

impl CueEventIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timestamps carrying at least one event
    #[must_use]
    pub fn timestamp_count(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the index holds no events at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Insert one event per distinct timestamp of the cue.
    ///
    /// The event set is `{start} ∪ inner ∪ {end}` with per-timestamp
    /// deduplication: an inner time equal to the start folds into the start
    /// event, and inner times outside `(start, end)` produce no event.
    pub fn add(&mut self, handle: CueHandle, cue: &Cue) {
        self.push_event(cue.start_ms, handle, EventKind::Start);
        for &time_ms in cue.kind.inner_times_ms() {
            if time_ms > cue.start_ms && time_ms < cue.end_ms {
                self.push_event(time_ms, handle, EventKind::Inner);
            }
        }
        self.push_event(cue.end_ms, handle, EventKind::End);
    }

    /// Remove all of the cue's events, dropping buckets that become empty
    pub fn remove(&mut self, handle: CueHandle, cue: &Cue) {
        self.remove_at(cue.start_ms, handle);
        for &time_ms in cue.kind.inner_times_ms() {
            self.remove_at(time_ms, handle);
        }
        self.remove_at(cue.end_ms, handle);
    }

    /// All events with `lo < time <= hi`, ascending by timestamp and in
    /// insertion order within one timestamp
    pub fn entries_between(
        &self,
        lo: i64,
        hi: i64,
    ) -> impl Iterator<Item = (i64, CueEvent)> + '_ {
        self.buckets
            .range((Bound::Excluded(lo), Bound::Included(hi)))
            .flat_map(|(&time_ms, events)| events.iter().map(move |&event| (time_ms, event)))
    }

    /// The earliest bucket with `after < time <= hi`, as an owned snapshot.
    ///
    /// The snapshot keeps a walk valid while the caller mutates the index:
    /// processing an end event may remove the cue (and with it entries of
    /// the *current* bucket), which is the one removal the walk must
    /// tolerate. Restart by passing the returned timestamp back as `after`.
    #[must_use]
    pub fn next_bucket_after(&self, after: i64, hi: i64) -> Option<(i64, Vec<CueEvent>)> {
        self.buckets
            .range((Bound::Excluded(after), Bound::Included(hi)))
            .next()
            .map(|(&time_ms, events)| (time_ms, events.clone()))
    }

    /// Smallest indexed timestamp strictly greater than `time_ms`
    #[must_use]
    pub fn next_time_after(&self, time_ms: i64) -> Option<i64> {
        self.buckets
            .range((Bound::Excluded(time_ms), Bound::Unbounded))
            .next()
            .map(|(&t, _)| t)
    }

    /// Drop every event
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    fn push_event(&mut self, time_ms: i64, handle: CueHandle, kind: EventKind) {
        let bucket = self.buckets.entry(time_ms).or_default();
        // One event per cue per timestamp; start wins over a colliding inner
        if bucket.iter().any(|e| e.handle == handle) {
            return;
        }
        bucket.push(CueEvent { handle, kind });
    }

    fn remove_at(&mut self, time_ms: i64, handle: CueHandle) {
        if let Some(bucket) = self.buckets.get_mut(&time_ms) {
            bucket.retain(|e| e.handle != handle);
            if bucket.is_empty() {
                self.buckets.remove(&time_ms);
            }
        }
    }
}
