//! # vtt-core
//!
//! Incremental WebVTT ingestion parser and cue data model. Turns a
//! possibly-fragmented text stream arriving from a decoder into typed cue
//! and region records, without ever requiring the whole document up front.
//!
//! ## Features
//!
//! - **Chunked input**: feed arbitrarily split text fragments, including
//!   splits mid-line, mid-timestamp, or between the bytes of a CRLF pair
//! - **Recoverable diagnostics**: malformed settings and header lines are
//!   recorded as [`ParseIssue`]s while parsing continues
//! - **Typed cue settings**: writing direction, line, position, size,
//!   alignment, and region association with the positioning exclusivity rule
//! - **Inline timestamps**: `<HH:MM:SS.mmm>` tags inside cue text become the
//!   cue's inner timeline for karaoke-style pacing
//!
//! ## Quick Start
//!
//! ```rust
//! use vtt_core::parser::{VttEvent, VttParser};
//!
//! let mut parser = VttParser::new();
//! let mut events = parser.feed("WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello\n");
//! events.extend(parser.flush());
//!
//! let cue = match &events[0] {
//!     VttEvent::Cue(cue) => cue,
//!     VttEvent::Region(_) => unreachable!(),
//! };
//! assert_eq!(cue.start_ms, 1000);
//! assert_eq!(cue.end_ms, 2500);
//! assert_eq!(cue.text, "Hello");
//! ```

#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod cue;
pub mod parser;
pub mod utils;

pub use cue::{
    Anchor, Cue, CueKind, CueSettings, LinePosition, Region, RunId, ScrollMode, TextAlign,
    WritingDirection,
};
pub use parser::{IssueCategory, IssueSeverity, ParseError, ParseIssue, VttEvent, VttParser};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for fallible core operations
pub type Result<T> = core::result::Result<T, ParseError>;
