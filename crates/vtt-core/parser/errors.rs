//! Parser error and diagnostic types.
//!
//! Two layers, matching how ingestion recovers: [`ParseError`] values
//! describe individual failures (a bad timestamp, a percentage out of
//! range), while [`ParseIssue`] records wrap them with location and severity
//! so parsing can continue past recoverable problems. The only terminal
//! condition is a stream that fails the `WEBVTT` signature check.

use core::fmt;
use thiserror::Error;

/// Failures produced while parsing stream content.
///
/// Most of these are recoverable at the stream level: the offending token or
/// line is skipped and the failure is recorded as a [`ParseIssue`].
/// [`ParseError::BadSignature`] is the exception and sinks the whole stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Stream did not begin with a `WEBVTT` signature line
    #[error("stream does not start with WEBVTT signature: {line:?}")]
    BadSignature {
        /// The offending first line
        line: String,
    },

    /// Timestamp did not match `(\d+:)?[0-5]\d:[0-5]\d\.\d{3}`
    #[error("malformed timestamp: {value:?}")]
    MalformedTimestamp {
        /// The rejected token
        value: String,
    },

    /// Timing line lacked the `-->` arrow or a parsable side of it
    #[error("malformed cue timing line: {line:?}")]
    MalformedTimingLine {
        /// The rejected line
        line: String,
    },

    /// Percentage token was not digits (plus optional decimal point) and `%`
    #[error("malformed percentage: {value:?}")]
    MalformedPercentage {
        /// The rejected token
        value: String,
    },

    /// Percentage parsed but fell outside `0..=100`
    #[error("percentage out of range: {value:?}")]
    PercentageOutOfRange {
        /// The rejected token
        value: String,
    },

    /// A cue setting had an unknown name or an unparsable value
    #[error("invalid cue setting {name}:{value}")]
    InvalidCueSetting {
        /// Setting key
        name: String,
        /// Setting value
        value: String,
    },

    /// A region setting had an unknown name or an unparsable value
    #[error("invalid region setting {name}:{value}")]
    InvalidRegionSetting {
        /// Setting key
        name: String,
        /// Setting value
        value: String,
    },

    /// Anchor value was not of the form `x%,y%`
    #[error("malformed anchor: {value:?}")]
    MalformedAnchor {
        /// The rejected token
        value: String,
    },
}

/// Severity of a recoverable parse issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueSeverity {
    /// Useful to know, no effect on output
    Info,
    /// Non-standard input that parsed anyway
    Warning,
    /// Input that was dropped or replaced during recovery
    Error,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Issue categories for filtering diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCategory {
    /// Signature and block structure problems
    Structure,
    /// Timing line and timestamp problems
    Timing,
    /// Cue setting problems
    Settings,
    /// Region declaration problems
    Region,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Timing => write!(f, "timing"),
            Self::Settings => write!(f, "settings"),
            Self::Region => write!(f, "region"),
        }
    }
}

/// A recoverable problem recorded during parsing.
///
/// Issues never abort ingestion; they exist so hosts can surface diagnostics
/// for streams that parse with losses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// How serious the issue is
    pub severity: IssueSeverity,
    /// What part of the grammar it belongs to
    pub category: IssueCategory,
    /// Human-readable description
    pub message: String,
    /// 1-based line number in the logical (reassembled) stream
    pub line: u32,
}

impl ParseIssue {
    /// Build an issue from a parse error at the given line
    #[must_use]
    pub fn from_error(error: &ParseError, category: IssueCategory, line: u32) -> Self {
        Self {
            severity: IssueSeverity::Error,
            category,
            message: error.to_string(),
            line,
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] line {}: {}",
            self.severity, self.category, self.line, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display_includes_location() {
        let issue = ParseIssue::from_error(
            &ParseError::MalformedPercentage {
                value: "abc%".into(),
            },
            IssueCategory::Settings,
            12,
        );
        let rendered = issue.to_string();
        assert!(rendered.contains("line 12"));
        assert!(rendered.contains("abc%"));
    }

    #[test]
    fn range_and_grammar_failures_are_distinct() {
        let grammar = ParseError::MalformedPercentage {
            value: "50".into(),
        };
        let range = ParseError::PercentageOutOfRange {
            value: "150%".into(),
        };
        assert_ne!(grammar.to_string(), range.to_string());
    }
}
