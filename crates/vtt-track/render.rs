//! Renderer-facing snapshot interface.
//!
//! The engine never holds a renderer callback while its own lock is held;
//! [`CueRenderer::update_view`] always receives an owned snapshot taken
//! after the active set settled.

use std::sync::Arc;

use vtt_core::cue::{Cue, Region};

/// One active cue as the renderer should currently show it
#[derive(Debug, Clone)]
pub struct ActiveCue {
    /// The cue record (text, timing, settings)
    pub cue: Arc<Cue>,
    /// Region the cue renders into, when it kept a region association
    pub region: Option<Arc<Region>>,
    /// Most recent inner timestamp reached, for cues with an inner timeline
    pub inner_time_ms: Option<i64>,
}

/// Sink for active-set updates.
///
/// Called whenever the active set may have changed, including forced
/// rebuilds after a seek and with an empty slice on stop or hide. Calls
/// arrive outside the track lock, so an implementation may call back into
/// the track freely.
pub trait CueRenderer: Send + Sync {
    /// Replace the displayed cues with this snapshot
    fn update_view(&self, active: &[ActiveCue]);
}
