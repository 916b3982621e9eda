//! Chunk-seam independence tests for the ingestion parser.
//!
//! The decoder may fragment the text stream anywhere. Parsing results must
//! be identical for every split point, including splits inside a timestamp
//! and between the CR and LF of a CRLF pair.

use pretty_assertions::assert_eq;
use vtt_core::parser::{VttEvent, VttParser};
use vtt_core::Cue;

fn parse_in_chunks(chunks: &[&str]) -> (Vec<VttEvent>, usize) {
    let mut parser = VttParser::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(parser.feed(chunk));
    }
    events.extend(parser.flush());
    (events, parser.issues().len())
}

fn cues_of(events: Vec<VttEvent>) -> Vec<Cue> {
    events
        .into_iter()
        .filter_map(|e| match e {
            VttEvent::Cue(cue) => Some(cue),
            VttEvent::Region(_) => None,
        })
        .collect()
}

#[test]
fn two_way_splits_yield_identical_results() {
    let doc = "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello\n\n";
    let (reference, _) = parse_in_chunks(&[doc]);
    let reference = cues_of(reference);
    assert_eq!(reference.len(), 1);
    assert_eq!(reference[0].start_ms, 1000);
    assert_eq!(reference[0].end_ms, 2500);
    assert_eq!(reference[0].text, "Hello");

    for split in 0..=doc.len() {
        let (events, issues) = parse_in_chunks(&[&doc[..split], &doc[split..]]);
        assert_eq!(cues_of(events), reference, "split at byte {split}");
        assert_eq!(issues, 0, "split at byte {split}");
    }
}

#[test]
fn crlf_document_survives_every_split() {
    let doc = "WEBVTT\r\n\r\nid1\r\n00:00:01.000 --> 00:00:02.000 align:start\r\nfirst\r\n\r\n00:01:00.000 --> 00:01:30.000\r\nsecond line one\r\nsecond line two\r\n\r\n";
    let (reference, _) = parse_in_chunks(&[doc]);
    let reference = cues_of(reference);
    assert_eq!(reference.len(), 2);
    assert_eq!(reference[0].id.as_deref(), Some("id1"));
    assert_eq!(reference[1].text, "second line one\nsecond line two");

    for split in 0..=doc.len() {
        let (events, issues) = parse_in_chunks(&[&doc[..split], &doc[split..]]);
        assert_eq!(cues_of(events), reference, "split at byte {split}");
        assert_eq!(issues, 0, "split at byte {split}");
    }
}

#[test]
fn three_way_splits_inside_timestamp() {
    let doc = "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello\n\n";
    // Split in the middle of both timestamps
    let (events, issues) = parse_in_chunks(&["WEBVTT\n\n00:00:0", "1.000 --> 00:0", "0:02.500\nHello\n\n"]);
    assert_eq!(issues, 0);
    let cues = cues_of(events);
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].start_ms, 1000);
    assert_eq!(cues[0].end_ms, 2500);

    let (single, _) = parse_in_chunks(&[doc]);
    assert_eq!(cues, cues_of(single));
}

#[test]
fn byte_at_a_time_feeding() {
    let doc = "WEBVTT\n\nkaraoke\n00:00:01.000 --> 00:00:04.000\n<00:00:02.000>la<00:00:03.000>la\n\n";
    let chunks: Vec<String> = doc.chars().map(String::from).collect();
    let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let (events, issues) = parse_in_chunks(&chunk_refs);
    assert_eq!(issues, 0);

    let cues = cues_of(events);
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].kind.inner_times_ms(), &[2000, 3000]);
}

#[test]
fn multiple_units_through_one_parser() {
    let mut parser = VttParser::new();
    let mut events = parser.feed("WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nunit one");
    events.extend(parser.flush());
    events.extend(parser.feed("WEBVTT\n\n00:00:05.000 --> 00:00:06.000\nunit two"));
    events.extend(parser.flush());

    let cues = cues_of(events);
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].text, "unit one");
    assert_eq!(cues[1].text, "unit two");
}
