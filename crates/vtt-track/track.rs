//! The cue track: one subtitle stream's engine state.
//!
//! A [`CueTrack`] owns the cue arena, the event index, the run tracker, and
//! one ingestion parser, all behind a single mutex. Two independent threads
//! drive it: the decoder thread through [`on_data`](CueTrack::on_data) /
//! [`add_cue`](CueTrack::add_cue), and the clock thread through the
//! [`TimeListener`] callbacks. The renderer is always called outside the
//! lock, on an owned snapshot, so a UI-owned renderer cannot form a
//! lock-order cycle with the engine.
//!
//! Active-set maintenance is incremental: each clock advance walks only the
//! events in `(last_update, now]`. A seek (or any backward time movement)
//! voids that delta window and forces a full rebuild from the epoch.

use std::sync::{Arc, Weak};
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;

use vtt_core::cue::{Cue, Region, RunId};
use vtt_core::parser::{ParseIssue, VttEvent, VttParser};

use crate::arena::{CueArena, CueHandle};
use crate::clock::{MediaClock, TimeListener};
use crate::debounce::RefreshCoalescer;
use crate::index::{CueEventIndex, EventKind};
use crate::render::{ActiveCue, CueRenderer};
use crate::runs::RunTracker;

/// "No clock position processed yet" sentinel
const UNKNOWN_TIME_MS: i64 = -1;

/// Coalescing window for bursty `add_cue` refreshes
const REFRESH_DEBOUNCE: Duration = Duration::from_millis(10);

struct TrackState {
    arena: CueArena,
    index: CueEventIndex,
    runs: RunTracker,
    regions: AHashMap<String, Arc<Region>>,
    parser: VttParser,
    /// Currently active cues, in activation order
    active: Vec<CueHandle>,
    /// Upper edge of the last processed delta window
    last_update_time_ms: i64,
    /// Most recent clock position, [`UNKNOWN_TIME_MS`] when stopped
    last_time_ms: i64,
    /// Wake-up currently registered with the clock
    next_scheduled_ms: Option<i64>,
    visible: bool,
    clock: Option<Arc<dyn MediaClock>>,
    renderer: Option<Arc<dyn CueRenderer>>,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            arena: CueArena::new(),
            index: CueEventIndex::new(),
            runs: RunTracker::new(),
            regions: AHashMap::new(),
            parser: VttParser::new(),
            active: Vec::new(),
            last_update_time_ms: UNKNOWN_TIME_MS,
            last_time_ms: UNKNOWN_TIME_MS,
            next_scheduled_ms: None,
            visible: false,
            clock: None,
            renderer: None,
        }
    }
}

pub(crate) struct TrackInner {
    state: Mutex<TrackState>,
    refresh: RefreshCoalescer,
    self_ref: Weak<TrackInner>,
}

/// A single subtitle stream's cue engine.
///
/// Dropping the track stops it: pending clock notifications and the
/// debounce deadline are cancelled and all cues are released.
pub struct CueTrack {
    inner: Arc<TrackInner>,
}

impl Default for CueTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl CueTrack {
    /// Create a hidden track with no clock and no renderer
    #[must_use]
    pub fn new() -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<TrackInner>| {
            let for_refresh = weak.clone();
            TrackInner {
                state: Mutex::new(TrackState::default()),
                refresh: RefreshCoalescer::new(move || {
                    if let Some(inner) = for_refresh.upgrade() {
                        inner.debounced_refresh();
                    }
                }),
                self_ref: weak.clone(),
            }
        });
        Self { inner }
    }

    /// Replace the media clock, cancelling outstanding notifications
    /// against the old one first
    pub fn set_time_provider(&self, clock: Option<Arc<dyn MediaClock>>) {
        let mut state = self.inner.state.lock();
        if let (Some(old), Some(listener)) = (state.clock.take(), self.inner.listener()) {
            old.cancel_notifications(&listener);
        }
        state.next_scheduled_ms = None;
        state.clock = clock;
        self.inner.schedule_timed_events(&mut state);
    }

    /// Attach the renderer that receives active-set snapshots
    pub fn set_renderer(&self, renderer: Option<Arc<dyn CueRenderer>>) {
        self.inner.state.lock().renderer = renderer;
    }

    /// Make the track visible and refresh the view
    pub fn show(&self) {
        self.inner.refresh_now(|state| state.visible = true);
    }

    /// Hide the track; the renderer receives an empty snapshot
    pub fn hide(&self) {
        self.inner.refresh_now(|state| state.visible = false);
    }

    /// Feed one decode unit fragment to the ingestion parser.
    ///
    /// Completed cues are added under `run_id`; declared regions are
    /// retained for cue association. `eos` ends the logical unit: the
    /// parser flushes and the run is finished (bucketed for discard at its
    /// end time).
    pub fn on_data(&self, data: &[u8], eos: bool, run_id: RunId) {
        let text = String::from_utf8_lossy(data);
        let mut state = self.inner.state.lock();

        let mut events = state.parser.feed(&text);
        if eos {
            events.extend(state.parser.flush());
        }
        for event in events {
            match event {
                VttEvent::Cue(cue) => {
                    self.inner.add_cue_locked(&mut state, Arc::new(cue), run_id);
                }
                VttEvent::Region(region) => {
                    state.regions.insert(region.id.clone(), Arc::new(region));
                }
            }
        }
        if eos {
            state.runs.finish(run_id);
        }
    }

    /// Add one cue directly.
    ///
    /// Returns `false` for zero- or negative-duration cues, which are
    /// silently dropped. When the cue overlaps the current clock position
    /// on a visible track, a debounced view refresh is scheduled; otherwise
    /// the clock wake-up is brought forward if this cue needs it sooner.
    pub fn add_cue(&self, cue: Cue, run_id: RunId) -> bool {
        let mut state = self.inner.state.lock();
        self.inner.add_cue_locked(&mut state, Arc::new(cue), run_id)
    }

    /// Override a run's discard time; takes effect at the next sweep
    pub fn set_run_discard_time_ms(&self, run_id: RunId, time_ms: i64) {
        self.inner
            .state
            .lock()
            .runs
            .set_discard_time(run_id, time_ms);
    }

    /// Finish a run without new data, bucketing it at its current end time
    pub fn finish_run(&self, run_id: RunId) {
        self.inner.state.lock().runs.finish(run_id);
    }

    /// Forward playback progress to `time_ms`
    pub fn on_clock_advance(&self, time_ms: i64) {
        self.inner.on_clock_advance(time_ms);
    }

    /// Playback jumped to `time_ms`; forces a full active-set rebuild
    pub fn on_seek(&self, time_ms: i64) {
        self.inner.on_seek(time_ms);
    }

    /// Playback stopped: clear the active set and cancel all wake-ups
    pub fn on_stop(&self) {
        self.inner.on_stop();
    }

    /// Snapshot of the current active set, ignoring visibility
    #[must_use]
    pub fn active_cues(&self) -> Vec<ActiveCue> {
        let state = self.inner.state.lock();
        snapshot_cues(&state, false)
    }

    /// Number of cues currently held by the track
    #[must_use]
    pub fn cue_count(&self) -> usize {
        self.inner.state.lock().arena.len()
    }

    /// Diagnostics collected by the ingestion parser so far
    #[must_use]
    pub fn parser_issues(&self) -> Vec<ParseIssue> {
        self.inner.state.lock().parser.issues().to_vec()
    }

    /// The listener to register with clock implementations that deliver
    /// callbacks themselves
    #[must_use]
    pub fn listener(&self) -> Arc<dyn TimeListener> {
        self.inner.clone()
    }
}

impl Drop for CueTrack {
    fn drop(&mut self) {
        self.inner.on_stop();
        let mut state = self.inner.state.lock();
        state.runs.clear();
        state.index.clear();
        state.arena.clear();
    }
}

impl TimeListener for TrackInner {
    fn on_time(&self, time_ms: i64) {
        self.on_clock_advance(time_ms);
    }

    fn on_seek(&self, time_ms: i64) {
        TrackInner::on_seek(self, time_ms);
    }

    fn on_stop(&self) {
        TrackInner::on_stop(self);
    }
}

impl TrackInner {
    fn listener(&self) -> Option<Arc<dyn TimeListener>> {
        self.self_ref
            .upgrade()
            .map(|inner| inner as Arc<dyn TimeListener>)
    }

    fn on_clock_advance(&self, time_ms: i64) {
        let (renderer, snapshot) = {
            let mut state = self.state.lock();
            self.update_active_cues(&mut state, false, time_ms);
            state.last_time_ms = time_ms;
            self.schedule_timed_events(&mut state);
            (state.renderer.clone(), snapshot_cues(&state, true))
        };
        if let Some(renderer) = renderer {
            renderer.update_view(&snapshot);
        }
    }

    fn on_seek(&self, time_ms: i64) {
        let (renderer, snapshot) = {
            let mut state = self.state.lock();
            self.update_active_cues(&mut state, true, time_ms);
            state.last_time_ms = time_ms;
            self.schedule_timed_events(&mut state);
            (state.renderer.clone(), snapshot_cues(&state, true))
        };
        if let Some(renderer) = renderer {
            renderer.update_view(&snapshot);
        }
    }

    fn on_stop(&self) {
        self.refresh.cancel();
        let renderer = {
            let mut state = self.state.lock();
            state.active.clear();
            state.last_time_ms = UNKNOWN_TIME_MS;
            state.next_scheduled_ms = None;
            if let (Some(clock), Some(listener)) = (state.clock.clone(), self.listener()) {
                clock.cancel_notifications(&listener);
            }
            state.renderer.clone()
        };
        if let Some(renderer) = renderer {
            renderer.update_view(&[]);
        }
    }

    /// Debounce deadline expired: rebuild at the current clock position
    fn debounced_refresh(&self) {
        let (renderer, snapshot) = {
            let mut state = self.state.lock();
            let now = state
                .clock
                .as_ref()
                .and_then(|clock| clock.current_time_ms(false, true).ok());
            let Some(now) = now else {
                return;
            };
            self.update_active_cues(&mut state, true, now);
            state.last_time_ms = now;
            self.schedule_timed_events(&mut state);
            (state.renderer.clone(), snapshot_cues(&state, true))
        };
        if let Some(renderer) = renderer {
            renderer.update_view(&snapshot);
        }
    }

    /// Apply a visibility change and push a matching view update
    fn refresh_now(&self, apply: impl FnOnce(&mut TrackState)) {
        let (renderer, snapshot) = {
            let mut state = self.state.lock();
            apply(&mut state);
            let now = state
                .clock
                .as_ref()
                .and_then(|clock| clock.current_time_ms(false, true).ok());
            if let Some(now) = now {
                self.update_active_cues(&mut state, true, now);
                state.last_time_ms = now;
                self.schedule_timed_events(&mut state);
            }
            (state.renderer.clone(), snapshot_cues(&state, true))
        };
        if let Some(renderer) = renderer {
            renderer.update_view(&snapshot);
        }
    }

    fn add_cue_locked(&self, state: &mut TrackState, cue: Arc<Cue>, run_id: RunId) -> bool {
        if !cue.has_positive_duration() {
            log::debug!(
                "dropping cue with non-positive duration [{}, {}]",
                cue.start_ms,
                cue.end_ms
            );
            return false;
        }

        let handle = state.arena.insert(cue.clone(), run_id);
        state.index.add(handle, &cue);
        if let Some(entry) = state.arena.get_mut(handle) {
            entry.in_index = true;
        }
        state.runs.record_cue(handle, &mut state.arena);

        // The clock query may fail while stopped; that only means "cannot
        // determine overlap now" and falls through to scheduling
        let now = state
            .clock
            .as_ref()
            .and_then(|clock| clock.current_time_ms(false, true).ok());

        if state.visible && now.is_some_and(|n| cue.start_ms <= n && n <= cue.end_ms) {
            // Coalesce rapid decode-batch additions into one refresh
            self.refresh.schedule(REFRESH_DEBOUNCE);
        } else if state.visible
            && cue.end_ms >= state.last_time_ms
            && state.next_scheduled_ms.map_or(true, |at| cue.start_ms < at)
        {
            self.schedule_timed_events(state);
        }
        true
    }

    /// Register the next wake-up with the clock when it changed
    fn schedule_timed_events(&self, state: &mut TrackState) {
        let Some(clock) = state.clock.clone() else {
            return;
        };
        let next = state.index.next_time_after(state.last_time_ms);
        if next != state.next_scheduled_ms {
            state.next_scheduled_ms = next;
            if let Some(listener) = self.listener() {
                clock.notify_at(next, &listener);
            }
        }
    }

    /// The central delta walk.
    ///
    /// Clears the active set first on an explicit rebuild or whenever time
    /// moved backward, then processes every event in the delta window in
    /// ascending timestamp order, then sweeps expired runs.
    fn update_active_cues(&self, state: &mut TrackState, rebuild: bool, time_ms: i64) {
        let mut cursor = state.last_update_time_ms;
        if rebuild || state.last_update_time_ms > time_ms {
            state.active.clear();
            cursor = UNKNOWN_TIME_MS;
        }

        while let Some((bucket_ms, events)) = state.index.next_bucket_after(cursor, time_ms) {
            cursor = bucket_ms;
            for event in events {
                let Some(entry) = state.arena.get_mut(event.handle) else {
                    debug_assert!(false, "event index references a freed cue");
                    log::warn!("skipping event at {bucket_ms}ms for a freed cue");
                    continue;
                };
                match event.kind {
                    EventKind::End => {
                        let cue = entry.cue.clone();
                        let ephemeral = entry.run_id.is_ephemeral();
                        state.active.retain(|&h| h != event.handle);
                        if ephemeral {
                            // One-shot cue: gone for good once its end event
                            // fires. End events are the only entries removed
                            // mid-walk; the bucket snapshot keeps us valid.
                            state.index.remove(event.handle, &cue);
                            state.arena.release_from_index(event.handle);
                        }
                    }
                    EventKind::Start => {
                        if !entry.cue.kind.inner_times_ms().is_empty() {
                            entry.last_inner_time_ms = Some(bucket_ms);
                        }
                        if !state.active.contains(&event.handle) {
                            state.active.push(event.handle);
                        }
                    }
                    EventKind::Inner => {
                        entry.last_inner_time_ms = Some(bucket_ms);
                    }
                }
            }
        }

        let evicted = state
            .runs
            .sweep_expired(time_ms, &mut state.index, &mut state.arena);
        if !evicted.is_empty() {
            state.active.retain(|h| !evicted.contains(h));
        }

        state.last_update_time_ms = time_ms;
    }
}

/// Owned snapshot of the active set; hidden tracks render as empty
fn snapshot_cues(state: &TrackState, respect_visibility: bool) -> Vec<ActiveCue> {
    if respect_visibility && !state.visible {
        return Vec::new();
    }
    state
        .active
        .iter()
        .filter_map(|&handle| {
            let entry = state.arena.get(handle)?;
            let region = entry
                .cue
                .settings
                .region_id
                .as_ref()
                .and_then(|id| state.regions.get(id).cloned());
            Some(ActiveCue {
                cue: entry.cue.clone(),
                region,
                inner_time_ms: entry.last_inner_time_ms,
            })
        })
        .collect()
}
