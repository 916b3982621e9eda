//! # vtt-track
//!
//! Subtitle cue engine on top of [`vtt_core`]: decides *which* cues are
//! visible at any instant of a playing, seeking, or stopped media clock and
//! *when* the active set must be recomputed next. Rendering stays outside;
//! the engine hands immutable snapshots to a [`CueRenderer`].
//!
//! ## Architecture
//!
//! - [`CueEventIndex`]: time-ordered index over cue start/inner/end events
//! - [`RunTracker`]: buckets decoder-defined cue batches by discard time for
//!   O(expired) bulk sweeps
//! - [`CueTrack`]: owns both plus the cue arena, drives active-cue deltas
//!   from a pluggable [`MediaClock`], and coalesces bursty decode batches
//!   into a single debounced view refresh
//!
//! Cues live in a generation-checked arena; the index and the run chains
//! hold handles, never references, so bulk eviction is index surgery with
//! no dangling-pointer risk.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vtt_track::{CueTrack, ManualClock, RunId};
//!
//! let clock = Arc::new(ManualClock::new());
//! let track = CueTrack::new();
//! track.set_time_provider(Some(clock.clone()));
//! track.show();
//!
//! track.on_data(b"WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello\n\n", true, RunId(1));
//! clock.advance_to(1500);
//! assert_eq!(track.active_cues().len(), 1);
//! ```

#![deny(clippy::all)]
#![deny(unsafe_code)]

mod arena;
mod debounce;

pub mod clock;
pub mod index;
pub mod render;
pub mod runs;
pub mod track;

pub use arena::CueHandle;
pub use clock::{ClockError, ManualClock, MediaClock, TimeListener};
pub use index::{CueEvent, CueEventIndex, EventKind};
pub use render::{ActiveCue, CueRenderer};
pub use runs::RunTracker;
pub use track::CueTrack;

pub use vtt_core::cue::RunId;

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
