//! Resumable line-oriented WebVTT parser.
//!
//! Input arrives as arbitrarily fragmented text chunks from a decoder. The
//! parser reassembles lines across chunk seams (including a CRLF pair split
//! between two chunks), walks a small state machine over complete lines,
//! and returns finished cue and region records from each [`VttParser::feed`]
//! call. [`VttParser::flush`] ends the current logical unit: it processes
//! the retained partial line, yields any pending cue, and resets so the next
//! unit's `WEBVTT` signature parses immediately.
//!
//! # States
//!
//! `Start → Header → {CueId ⇄ CueTime → CueText}`, looping back to `CueId`
//! on the blank line that ends a cue. A stream failing the signature check
//! drops into the permanent `SkipRest` sink. `NOTE` comment blocks ride the
//! `CueText` state with no cue allocated, so their bodies are discarded
//! without ever being mistaken for cue text.

pub mod errors;
pub mod timestamp;

mod settings;

pub use errors::{IssueCategory, IssueSeverity, ParseError, ParseIssue};
pub use timestamp::{
    extract_inner_timestamps, format_timestamp_ms, parse_float_percentage, parse_int_percentage,
    parse_timestamp_ms,
};

use crate::cue::{Cue, CueKind, CueSettings, Region};
use crate::utils::{is_blank, next_complete_line, strip_bom};
use settings::{parse_cue_settings, parse_region_line};

/// A record completed by the parser
#[derive(Debug, Clone, PartialEq)]
pub enum VttEvent {
    /// A finished cue, emitted when the blank line after its text arrives
    /// (or at flush)
    Cue(Cue),
    /// A region declared in the stream header
    Region(Region),
}

/// Line-handler states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParserState {
    /// Expecting the `WEBVTT` signature line
    #[default]
    Start,
    /// Between the signature and the first blank line
    Header,
    /// Expecting a cue id, a timing line, or a `NOTE`
    CueId,
    /// A cue was allocated; expecting its timing line
    CueTime,
    /// Accumulating cue text (or discarding a `NOTE` body)
    CueText,
    /// Signature check failed; consume everything silently
    SkipRest,
}

/// Cue under construction
#[derive(Debug, Default)]
struct CueBuilder {
    id: Option<String>,
    start_ms: i64,
    end_ms: i64,
    settings: CueSettings,
    lines: Vec<String>,
    /// Set once a timing line has parsed; untimed builders are discarded
    timed: bool,
}

impl CueBuilder {
    fn build(self) -> Cue {
        let text = self.lines.join("\n");
        let inner_times_ms = extract_inner_timestamps(&text);
        let kind = if inner_times_ms.is_empty() {
            CueKind::Simple
        } else {
            CueKind::Timed { inner_times_ms }
        };
        Cue {
            id: self.id,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            settings: self.settings,
            text,
            kind,
        }
    }
}

/// Resumable WebVTT ingestion parser.
///
/// One parser instance handles one stream of logical units; feed chunks with
/// [`feed`](Self::feed) and end each unit with [`flush`](Self::flush).
/// Recoverable problems accumulate in [`issues`](Self::issues) while parsing
/// continues.
#[derive(Debug, Default)]
pub struct VttParser {
    state: ParserState,
    /// Retained text that does not yet form a complete line
    buffer: String,
    current: Option<CueBuilder>,
    issues: Vec<ParseIssue>,
    line_no: u32,
}

impl VttParser {
    /// Create a parser expecting a fresh `WEBVTT` signature
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one text chunk and collect any records it completes.
    ///
    /// Chunks may be split anywhere, including mid-timestamp and between the
    /// CR and LF of a CRLF pair; results are independent of the split
    /// points. The final (possibly incomplete) line fragment is retained
    /// for the next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<VttEvent> {
        let mut events = Vec::new();
        self.buffer.push_str(chunk);

        while let Some((line_len, consumed)) = next_complete_line(&self.buffer) {
            let line = self.buffer[..line_len].to_string();
            self.buffer.drain(..consumed);
            self.process_line(&line, &mut events);
        }
        events
    }

    /// End the current logical unit.
    ///
    /// Processes the retained fragment as a final line, yields the pending
    /// cue if one is complete, and resets to expect a new `WEBVTT`
    /// signature. Collected issues survive the reset.
    pub fn flush(&mut self) -> Vec<VttEvent> {
        let mut events = Vec::new();

        let mut tail = core::mem::take(&mut self.buffer);
        if tail.ends_with('\r') {
            tail.pop();
        }
        if !tail.is_empty() {
            let line = tail;
            self.process_line(&line, &mut events);
        }

        if let Some(builder) = self.current.take() {
            if builder.timed {
                events.push(VttEvent::Cue(builder.build()));
            }
        }

        self.state = ParserState::Start;
        events
    }

    /// Recoverable problems recorded so far
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<VttEvent>) {
        self.line_no += 1;
        match self.state {
            ParserState::Start => self.on_start_line(line),
            ParserState::Header => self.on_header_line(line, events),
            ParserState::CueId => self.on_cue_id_line(line),
            ParserState::CueTime => self.on_cue_time_line(line),
            ParserState::CueText => self.on_cue_text_line(line, events),
            ParserState::SkipRest => {}
        }
    }

    fn on_start_line(&mut self, line: &str) {
        let line = strip_bom(line);
        let signed = line == "WEBVTT"
            || line.starts_with("WEBVTT ")
            || line.starts_with("WEBVTT\t");
        if signed {
            self.state = ParserState::Header;
        } else {
            self.issues.push(ParseIssue::from_error(
                &ParseError::BadSignature {
                    line: line.to_string(),
                },
                IssueCategory::Structure,
                self.line_no,
            ));
            self.state = ParserState::SkipRest;
        }
    }

    fn on_header_line(&mut self, line: &str, events: &mut Vec<VttEvent>) {
        if is_blank(line) {
            self.state = ParserState::CueId;
        } else if line.contains("-->") {
            // Implicit first cue with no id and no separating blank line
            self.current = Some(CueBuilder::default());
            self.on_cue_time_line(line);
        } else if let Some((name, value)) = line.split_once(':') {
            if name == "Region" {
                if let Some(region) = parse_region_line(value.trim(), self.line_no, &mut self.issues)
                {
                    events.push(VttEvent::Region(region));
                }
            }
            // Other metadata headers are valid but unused
        }
        // Anything else is an unrecognized header line, ignored
    }

    fn on_cue_id_line(&mut self, line: &str) {
        if is_blank(line) {
            return;
        }
        if line.starts_with("NOTE") {
            // Comment block: ride CueText with no cue so the body is dropped
            self.current = None;
            self.state = ParserState::CueText;
            return;
        }

        self.current = Some(CueBuilder::default());
        if line.contains("-->") {
            self.on_cue_time_line(line);
        } else {
            if let Some(builder) = &mut self.current {
                builder.id = Some(line.to_string());
            }
            self.state = ParserState::CueTime;
        }
    }

    fn on_cue_time_line(&mut self, line: &str) {
        let parsed = line
            .split_once("-->")
            .ok_or_else(|| ParseError::MalformedTimingLine {
                line: line.to_string(),
            })
            .and_then(|(start, rest)| {
                let start_ms = parse_timestamp_ms(start.trim())?;
                let rest = rest.trim_start();
                let (end_token, settings_str) = match rest.split_once(char::is_whitespace) {
                    Some((end, tail)) => (end, tail),
                    None => (rest, ""),
                };
                let end_ms = parse_timestamp_ms(end_token)?;
                Ok((start_ms, end_ms, settings_str.to_string()))
            });

        match parsed {
            Ok((start_ms, end_ms, settings_str)) => {
                if let Some(builder) = &mut self.current {
                    builder.start_ms = start_ms;
                    builder.end_ms = end_ms;
                    builder.settings =
                        parse_cue_settings(&settings_str, self.line_no, &mut self.issues);
                    builder.timed = true;
                }
                self.state = ParserState::CueText;
            }
            Err(error) => {
                self.issues.push(ParseIssue::from_error(
                    &error,
                    IssueCategory::Timing,
                    self.line_no,
                ));
                self.current = None;
                // Skip the cue body through CueText; a blank line resumes
                self.state = if is_blank(line) {
                    ParserState::CueId
                } else {
                    ParserState::CueText
                };
            }
        }
    }

    fn on_cue_text_line(&mut self, line: &str, events: &mut Vec<VttEvent>) {
        if is_blank(line) {
            if let Some(builder) = self.current.take() {
                if builder.timed {
                    events.push(VttEvent::Cue(builder.build()));
                }
            }
            self.state = ParserState::CueId;
        } else if let Some(builder) = &mut self.current {
            builder.lines.push(line.to_string());
        }
        // No current cue: NOTE body or skipped cue, line is discarded
    }
}
