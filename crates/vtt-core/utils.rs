//! Text utilities shared by the ingestion path.
//!
//! Line reassembly is the delicate part: chunks may split a CRLF pair, so a
//! trailing bare CR is never treated as a complete terminator until more
//! input (or a flush) resolves it.

/// Strip a leading UTF-8 BOM if present
#[must_use]
pub fn strip_bom(line: &str) -> &str {
    line.strip_prefix('\u{feff}').unwrap_or(line)
}

/// Whether a line separates blocks (empty or whitespace-only)
#[must_use]
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Locate the next complete line in `buffer`.
///
/// Returns `(line_len, consumed)` in bytes, where `consumed` includes the
/// terminator (two bytes for CRLF). A trailing bare CR may be the first
/// half of a CRLF split across chunks, so it does not complete a line.
#[must_use]
pub fn next_complete_line(buffer: &str) -> Option<(usize, usize)> {
    let bytes = buffer.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\n' => return Some((i, i + 1)),
            b'\r' => {
                if i + 1 < bytes.len() {
                    let consumed = if bytes[i + 1] == b'\n' { i + 2 } else { i + 1 };
                    return Some((i, consumed));
                }
                return None;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_stripping() {
        assert_eq!(strip_bom("\u{feff}WEBVTT"), "WEBVTT");
        assert_eq!(strip_bom("WEBVTT"), "WEBVTT");
    }

    #[test]
    fn line_scanning() {
        assert_eq!(next_complete_line("ab\ncd"), Some((2, 3)));
        assert_eq!(next_complete_line("ab\r\ncd"), Some((2, 4)));
        assert_eq!(next_complete_line("ab\rcd"), Some((2, 3)));
        assert_eq!(next_complete_line("ab\r"), None);
        assert_eq!(next_complete_line("abcd"), None);
        assert_eq!(next_complete_line("\nrest"), Some((0, 1)));
    }

    #[test]
    fn blank_lines() {
        assert!(is_blank(""));
        assert!(is_blank("  \t"));
        assert!(!is_blank("x"));
    }
}
