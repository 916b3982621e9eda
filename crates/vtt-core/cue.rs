//! Cue and region data model shared by the parser and the cue engine.
//!
//! Types here are plain records: the parser produces them, the track engine
//! consumes them. Engine bookkeeping (event indexing, run chains) lives in
//! `vtt-track`, keeping this crate free of any playback state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decoder-assigned batch identifier for bulk cue discard.
///
/// Cues sharing a run id are discarded together once the run's discard time
/// is reached, regardless of their individual end times. Two values are
/// reserved: [`RunId::EPHEMERAL`] marks a cue dropped immediately after its
/// end event fires, and [`RunId::PERSISTENT`] marks a cue that survives
/// until its track is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunId(pub u64);

impl RunId {
    /// Cue is discarded as soon as its end event has been processed
    pub const EPHEMERAL: Self = Self(0);

    /// Cue survives until the owning track is destroyed
    pub const PERSISTENT: Self = Self(u64::MAX);

    /// Whether this id marks a one-shot cue with no run membership
    #[must_use]
    pub const fn is_ephemeral(self) -> bool {
        self.0 == Self::EPHEMERAL.0
    }

    /// Whether this id marks a cue pinned for the track's lifetime
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        self.0 == Self::PERSISTENT.0
    }

    /// Whether cues with this id participate in run tracking
    #[must_use]
    pub const fn is_tracked(self) -> bool {
        !self.is_ephemeral() && !self.is_persistent()
    }
}

/// Text writing direction from the `vertical` cue setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WritingDirection {
    /// Horizontal text, the default when `vertical` is absent
    #[default]
    Horizontal,
    /// Vertical text growing right-to-left (`vertical:rl`)
    VerticalRl,
    /// Vertical text growing left-to-right (`vertical:lr`)
    VerticalLr,
}

/// Line placement from the `line` cue setting.
///
/// An integer value snaps the cue to a line number; a percentage positions
/// it proportionally within the viewport without snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinePosition {
    /// Snap-to-lines placement at the given (possibly negative) line number
    Number(i32),
    /// Proportional placement, `0.0..=100.0`, no line snapping
    Percentage(f32),
}

/// Text alignment from the `align` cue setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextAlign {
    /// Aligned to the start of the line box
    Start,
    /// Centered, the WebVTT `middle` keyword
    #[default]
    Middle,
    /// Aligned to the end of the line box
    End,
    /// Left-aligned regardless of base direction
    Left,
    /// Right-aligned regardless of base direction
    Right,
}

/// Parsed cue settings from the suffix of a timing line.
///
/// All fields are optional; a cue with no settings renders with viewport
/// defaults. Setting any explicit positioning clears the region association,
/// so `region_id` and positioning are mutually exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CueSettings {
    /// Region this cue renders into, unless explicit positioning cleared it
    pub region_id: Option<String>,
    /// Writing direction (`vertical` setting)
    pub direction: WritingDirection,
    /// Line placement (`line` setting)
    pub line: Option<LinePosition>,
    /// Indent of the cue box within the line, percent (`position` setting)
    pub position: Option<f32>,
    /// Width of the cue box, percent (`size` setting)
    pub size: Option<f32>,
    /// Text alignment (`align` setting)
    pub align: Option<TextAlign>,
}

impl CueSettings {
    /// Whether any positioning that overrides region layout has been set.
    ///
    /// `align` intentionally does not count: it affects text flow inside the
    /// cue box, not where the box goes.
    #[must_use]
    pub fn has_explicit_positioning(&self) -> bool {
        self.direction != WritingDirection::Horizontal
            || self.line.is_some()
            || self.position.is_some()
            || self.size.is_some()
    }
}

/// Inner-timeline capability of a cue.
///
/// Cues with inline `<HH:MM:SS.mmm>` tags carry the extracted timestamps so
/// the engine can fire mid-cue time events; plain cues skip that machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CueKind {
    /// No inner timestamps; only start and end events exist
    Simple,
    /// Sorted, deduplicated inner timestamps in milliseconds
    Timed {
        /// Timestamps extracted from inline tags, ascending
        inner_times_ms: Vec<i64>,
    },
}

impl CueKind {
    /// Inner timestamps, empty for [`CueKind::Simple`]
    #[must_use]
    pub fn inner_times_ms(&self) -> &[i64] {
        match self {
            Self::Simple => &[],
            Self::Timed { inner_times_ms } => inner_times_ms,
        }
    }
}

/// A single timed unit of subtitle text.
///
/// Produced by the parser with `start_ms < end_ms` not yet enforced; the
/// engine silently drops zero- and negative-duration cues on insertion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cue {
    /// Optional cue identifier from the line preceding the timing line
    pub id: Option<String>,
    /// Display window start, milliseconds
    pub start_ms: i64,
    /// Display window end, milliseconds
    pub end_ms: i64,
    /// Positioning and alignment settings
    pub settings: CueSettings,
    /// Payload text, lines joined with `\n`, inline tags preserved
    pub text: String,
    /// Inner-timeline capability
    pub kind: CueKind,
}

impl Cue {
    /// Whether the display window is non-empty
    #[must_use]
    pub const fn has_positive_duration(&self) -> bool {
        self.start_ms < self.end_ms
    }
}

/// Anchor point as percentages of a box, `x%,y%`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anchor {
    /// Horizontal component, `0.0..=100.0`
    pub x: f32,
    /// Vertical component, `0.0..=100.0`
    pub y: f32,
}

/// Scroll behavior of a region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScrollMode {
    /// Lines are replaced in place
    #[default]
    None,
    /// New lines push existing lines up
    Up,
}

/// A rendering region declared in the stream header.
///
/// Cues reference regions by id through their `region` setting. The region
/// record itself is layout input for the renderer; the engine only stores
/// and forwards it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    /// Identifier cues refer to
    pub id: String,
    /// Width as a percentage of the viewport
    pub width: f32,
    /// Number of text lines the region holds
    pub lines: u32,
    /// Anchor point within the region box
    pub region_anchor: Anchor,
    /// Anchor point within the viewport the region anchor is pinned to
    pub viewport_anchor: Anchor,
    /// Scroll behavior
    pub scroll: ScrollMode,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            id: String::new(),
            width: 100.0,
            lines: 3,
            region_anchor: Anchor { x: 0.0, y: 100.0 },
            viewport_anchor: Anchor { x: 0.0, y: 100.0 },
            scroll: ScrollMode::None,
        }
    }
}
