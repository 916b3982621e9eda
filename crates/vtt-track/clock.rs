//! Media clock abstraction and a host-driven reference implementation.
//!
//! The engine never reads wall-clock time. It asks a [`MediaClock`] what
//! the media position is and registers exactly one future wake-up at a
//! time; repeated [`MediaClock::notify_at`] calls replace the pending
//! request. Implementations must never call back into the listener from
//! inside `notify_at`/`cancel_notifications`: those are invoked while the
//! track's lock is held.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;

/// The clock cannot report a position right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    /// Playback is not running, so there is no current media time
    #[error("media clock is not playing")]
    NotPlaying,
}

/// Callbacks a clock delivers to a registered listener.
///
/// Delivered from the clock's own thread; the track re-acquires its lock
/// inside each callback.
pub trait TimeListener: Send + Sync {
    /// Playback reached `time_ms` (normal forward progress)
    fn on_time(&self, time_ms: i64);
    /// Playback jumped to `time_ms`
    fn on_seek(&self, time_ms: i64);
    /// Playback stopped
    fn on_stop(&self);
}

/// A pluggable media position source.
///
/// `precise` asks for sub-frame accuracy where the backing player
/// distinguishes it; `monotonic` asks for a value that never runs backward
/// between calls. Both are hints, not guarantees.
pub trait MediaClock: Send + Sync {
    /// Current media position in milliseconds, or [`ClockError::NotPlaying`]
    fn current_time_ms(&self, precise: bool, monotonic: bool) -> Result<i64, ClockError>;

    /// Request a single wake-up at `time_ms`, replacing any pending request;
    /// `None` cancels the pending wake-up without registering a new one
    fn notify_at(&self, time_ms: Option<i64>, listener: &Arc<dyn TimeListener>);

    /// Request an immediate refresh callback at the clock's convenience
    fn schedule_update(&self, listener: &Arc<dyn TimeListener>);

    /// Drop every pending request for this listener
    fn cancel_notifications(&self, listener: &Arc<dyn TimeListener>);
}

#[derive(Default)]
struct ManualClockState {
    time_ms: i64,
    playing: bool,
    pending_notify_ms: Option<i64>,
    update_requested: bool,
    listener: Option<Weak<dyn TimeListener>>,
}

/// Host-driven clock for tests and embedders without a real player.
///
/// The host sets the position explicitly; [`advance_to`](Self::advance_to)
/// and [`seek_to`](Self::seek_to) deliver the matching listener callbacks.
/// Listener calls happen after the clock's own lock is released, so a
/// listener may re-enter the clock freely.
#[derive(Default)]
pub struct ManualClock {
    state: Mutex<ManualClockState>,
}

impl ManualClock {
    /// Create a stopped clock at position zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the clock is currently playing
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Start playback without moving the position
    pub fn play(&self) {
        self.state.lock().playing = true;
    }

    /// Advance to `time_ms` and fire the pending wake-up if it came due.
    ///
    /// Also delivers a wake-up when an update was requested via
    /// [`MediaClock::schedule_update`]. Marks the clock playing.
    pub fn advance_to(&self, time_ms: i64) {
        let listener = {
            let mut state = self.state.lock();
            state.playing = true;
            state.time_ms = time_ms;
            let due = state.pending_notify_ms.is_some_and(|at| at <= time_ms);
            if due || state.update_requested {
                state.pending_notify_ms = None;
                state.update_requested = false;
                state.listener.as_ref().and_then(Weak::upgrade)
            } else {
                None
            }
        };
        if let Some(listener) = listener {
            listener.on_time(time_ms);
        }
    }

    /// Jump to `time_ms` and deliver a seek callback
    pub fn seek_to(&self, time_ms: i64) {
        let listener = {
            let mut state = self.state.lock();
            state.playing = true;
            state.time_ms = time_ms;
            state.pending_notify_ms = None;
            state.listener.as_ref().and_then(Weak::upgrade)
        };
        if let Some(listener) = listener {
            listener.on_seek(time_ms);
        }
    }

    /// Stop playback and deliver a stop callback
    pub fn stop(&self) {
        let listener = {
            let mut state = self.state.lock();
            state.playing = false;
            state.pending_notify_ms = None;
            state.listener.as_ref().and_then(Weak::upgrade)
        };
        if let Some(listener) = listener {
            listener.on_stop();
        }
    }

    /// The wake-up currently requested by the listener, if any
    #[must_use]
    pub fn pending_notify_ms(&self) -> Option<i64> {
        self.state.lock().pending_notify_ms
    }
}

impl MediaClock for ManualClock {
    fn current_time_ms(&self, _precise: bool, _monotonic: bool) -> Result<i64, ClockError> {
        let state = self.state.lock();
        if state.playing {
            Ok(state.time_ms)
        } else {
            Err(ClockError::NotPlaying)
        }
    }

    fn notify_at(&self, time_ms: Option<i64>, listener: &Arc<dyn TimeListener>) {
        let mut state = self.state.lock();
        state.listener = Some(Arc::downgrade(listener));
        state.pending_notify_ms = time_ms;
    }

    fn schedule_update(&self, listener: &Arc<dyn TimeListener>) {
        let mut state = self.state.lock();
        state.listener = Some(Arc::downgrade(listener));
        state.update_requested = true;
    }

    fn cancel_notifications(&self, _listener: &Arc<dyn TimeListener>) {
        let mut state = self.state.lock();
        state.listener = None;
        state.pending_notify_ms = None;
        state.update_requested = false;
    }
}
