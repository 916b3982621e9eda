//! Deadline-based refresh coalescing.
//!
//! Bursty decode batches can land dozens of cues within a few
//! milliseconds; refreshing the renderer per cue would churn it for no
//! visible benefit. The coalescer owns a single deadline: scheduling
//! replaces any pending deadline, so only the last request in a burst
//! fires, and cancellation is synchronous. A dedicated worker thread
//! sleeps until the deadline and then invokes the callback, which
//! re-acquires the track lock itself.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct State {
    deadline: Option<Instant>,
    stopped: bool,
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

/// Single-deadline debounce primitive with a dedicated worker thread
pub(crate) struct RefreshCoalescer {
    shared: Arc<Shared>,
}

impl RefreshCoalescer {
    /// Spawn the worker; `callback` runs on the worker thread each time a
    /// deadline expires un-replaced and un-cancelled
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            cond: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        thread::spawn(move || {
            let mut guard = worker_shared.state.lock();
            loop {
                if guard.stopped {
                    break;
                }
                match guard.deadline {
                    None => {
                        worker_shared.cond.wait(&mut guard);
                    }
                    Some(deadline) => {
                        if Instant::now() >= deadline {
                            guard.deadline = None;
                            drop(guard);
                            callback();
                            guard = worker_shared.state.lock();
                        } else {
                            let _ = worker_shared.cond.wait_until(&mut guard, deadline);
                        }
                    }
                }
            }
        });

        Self { shared }
    }

    /// Arm (or re-arm) the deadline `delay` from now, cancelling any
    /// previously pending one
    pub fn schedule(&self, delay: Duration) {
        let mut state = self.shared.state.lock();
        state.deadline = Some(Instant::now() + delay);
        self.shared.cond.notify_one();
    }

    /// Synchronously drop any pending deadline
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = None;
        self.shared.cond.notify_one();
    }
}

impl Drop for RefreshCoalescer {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.stopped = true;
        state.deadline = None;
        self.shared.cond.notify_one();
        // The worker exits on its own; it only holds a weak path back to
        // the track, so no join is needed here
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn burst_of_schedules_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let coalescer = RefreshCoalescer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..20 {
            coalescer.schedule(Duration::from_millis(10));
        }
        thread::sleep(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let coalescer = RefreshCoalescer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        coalescer.schedule(Duration::from_millis(20));
        coalescer.cancel();
        thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rearming_after_fire_works() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let coalescer = RefreshCoalescer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        coalescer.schedule(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(60));
        coalescer.schedule(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(60));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
