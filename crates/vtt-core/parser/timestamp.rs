//! Timestamp and percentage micro-grammars.
//!
//! WebVTT timestamps are `HH:MM:SS.mmm` with optional hours, minutes and
//! seconds locked to `00..=59`, and exactly three millisecond digits.
//! Percentages are digits (plus a single decimal point for the float
//! variant) followed by `%`, in `0..=100`. A malformed numeral and an
//! out-of-range value fail with distinct errors so diagnostics can tell
//! them apart.

use super::errors::ParseError;
use crate::Result;

/// Parse a WebVTT timestamp into milliseconds.
///
/// Accepts `MM:SS.mmm` and `HH:MM:SS.mmm`; the hours field may be any
/// number of digits. Minutes and seconds outside `00..=59` are rejected.
///
/// # Example
///
/// ```rust
/// use vtt_core::parser::parse_timestamp_ms;
///
/// assert_eq!(parse_timestamp_ms("00:01.500")?, 1500);
/// assert_eq!(parse_timestamp_ms("1:02:03.004")?, 3_723_004);
/// assert!(parse_timestamp_ms("00:61.000").is_err());
/// # Ok::<(), vtt_core::ParseError>(())
/// ```
pub fn parse_timestamp_ms(value: &str) -> Result<i64> {
    let malformed = || ParseError::MalformedTimestamp {
        value: value.to_string(),
    };

    let (time_part, ms_part) = value.split_once('.').ok_or_else(malformed)?;
    if ms_part.len() != 3 || !ms_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let ms: i64 = ms_part.parse().map_err(|_| malformed())?;

    let fields: Vec<&str> = time_part.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [m, s] => ("0", *m, *s),
        [h, m, s] if !h.is_empty() && h.bytes().all(|b| b.is_ascii_digit()) => (*h, *m, *s),
        _ => return Err(malformed()),
    };

    let minutes = parse_sexagesimal_field(minutes).ok_or_else(malformed)?;
    let seconds = parse_sexagesimal_field(seconds).ok_or_else(malformed)?;
    let hours: i64 = hours.parse().map_err(|_| malformed())?;

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + ms)
}

/// Parse a two-digit `00..=59` field
fn parse_sexagesimal_field(field: &str) -> Option<i64> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = field.parse().ok()?;
    (value < 60).then_some(value)
}

/// Format milliseconds as a `HH:MM:SS.mmm` timestamp.
///
/// Negative inputs clamp to zero; the engine never stores them, so they can
/// only appear in diagnostics for already-rejected cues.
#[must_use]
pub fn format_timestamp_ms(time_ms: i64) -> String {
    let total = time_ms.max(0);
    let ms = total % 1000;
    let seconds = (total / 1000) % 60;
    let minutes = (total / 60_000) % 60;
    let hours = total / 3_600_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{ms:03}")
}

/// Parse an integer percentage token such as `40%`.
///
/// Only digits followed by `%` are accepted. A non-numeric token fails with
/// [`ParseError::MalformedPercentage`]; a numeric one outside `0..=100`
/// fails with [`ParseError::PercentageOutOfRange`].
pub fn parse_int_percentage(value: &str) -> Result<u32> {
    let digits = value
        .strip_suffix('%')
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| ParseError::MalformedPercentage {
            value: value.to_string(),
        })?;

    let parsed: u32 = digits
        .parse()
        .map_err(|_| ParseError::MalformedPercentage {
            value: value.to_string(),
        })?;
    if parsed > 100 {
        return Err(ParseError::PercentageOutOfRange {
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

/// Parse a percentage token allowing a single decimal point, such as `12.5%`
pub fn parse_float_percentage(value: &str) -> Result<f32> {
    let malformed = || ParseError::MalformedPercentage {
        value: value.to_string(),
    };

    let digits = value.strip_suffix('%').ok_or_else(malformed)?;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => return Err(malformed()),
        }
    }
    if !seen_digit {
        return Err(malformed());
    }

    let parsed: f32 = digits.parse().map_err(|_| malformed())?;
    if !(0.0..=100.0).contains(&parsed) {
        return Err(ParseError::PercentageOutOfRange {
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

/// Extract inline `<HH:MM:SS.mmm>` timestamp tags from cue text.
///
/// Returns the timestamps in ascending order with duplicates removed.
/// Non-timestamp tags (`<b>`, `<v Speaker>`, class tags) are left alone.
#[must_use]
pub fn extract_inner_timestamps(text: &str) -> Vec<i64> {
    let mut times = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find('>') else { break };
        let tag = &rest[..close];
        if tag.starts_with(|c: char| c.is_ascii_digit()) {
            if let Ok(time_ms) = parse_timestamp_ms(tag) {
                times.push(time_ms);
            }
        }
        rest = &rest[close + 1..];
    }
    times.sort_unstable();
    times.dedup();
    times
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optional_hours() {
        assert_eq!(parse_timestamp_ms("00:00.000").unwrap(), 0);
        assert_eq!(parse_timestamp_ms("01:02.003").unwrap(), 62_003);
        assert_eq!(parse_timestamp_ms("10:01:02.003").unwrap(), 36_062_003);
        assert_eq!(parse_timestamp_ms("123:00:00.000").unwrap(), 442_800_000);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(parse_timestamp_ms("00:60.000").is_err());
        assert!(parse_timestamp_ms("60:00.000").is_err());
        assert!(parse_timestamp_ms("0:00.000").is_err());
        assert!(parse_timestamp_ms("00:00.00").is_err());
        assert!(parse_timestamp_ms("00:00,000").is_err());
        assert!(parse_timestamp_ms("").is_err());
    }

    #[test]
    fn formats_round_trip() {
        for &ms in &[0, 999, 1000, 62_003, 36_062_003] {
            let formatted = format_timestamp_ms(ms);
            assert_eq!(parse_timestamp_ms(&formatted).unwrap(), ms);
        }
        assert_eq!(format_timestamp_ms(-5), "00:00:00.000");
    }

    #[test]
    fn int_percentage_grammar() {
        assert_eq!(parse_int_percentage("50%").unwrap(), 50);
        assert_eq!(parse_int_percentage("0%").unwrap(), 0);
        assert_eq!(parse_int_percentage("100%").unwrap(), 100);

        assert!(matches!(
            parse_int_percentage("150%"),
            Err(ParseError::PercentageOutOfRange { .. })
        ));
        assert!(matches!(
            parse_int_percentage("-5%"),
            Err(ParseError::MalformedPercentage { .. })
        ));
        assert!(matches!(
            parse_int_percentage("abc%"),
            Err(ParseError::MalformedPercentage { .. })
        ));
        assert!(matches!(
            parse_int_percentage("50"),
            Err(ParseError::MalformedPercentage { .. })
        ));
    }

    #[test]
    fn float_percentage_grammar() {
        assert_eq!(parse_float_percentage("12.5%").unwrap(), 12.5);
        assert_eq!(parse_float_percentage("100%").unwrap(), 100.0);
        assert!(parse_float_percentage("1.2.3%").is_err());
        assert!(parse_float_percentage(".%").is_err());
        assert!(matches!(
            parse_float_percentage("100.5%"),
            Err(ParseError::PercentageOutOfRange { .. })
        ));
    }

    #[test]
    fn inner_timestamp_extraction() {
        let text = "<00:00:01.000>One<00:00:02.000>Two <b>bold</b> <00:00:01.000>dup";
        assert_eq!(extract_inner_timestamps(text), vec![1000, 2000]);
        assert!(extract_inner_timestamps("no tags here").is_empty());
        assert!(extract_inner_timestamps("<b>only markup</b>").is_empty());
    }
}
