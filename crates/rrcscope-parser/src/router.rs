//! Entry body routing.
//!
//! An entry body is a sequence of blocks: `key = value` metadata lines, an
//! `Interpreted PDU:` marker followed by value notation, and "further
//! decoding" sections framed by `====` boundaries. The router walks the body
//! with a cursor and hands each block to the scanner that recognises it.

use rrcscope_core::prelude::*;
use rrcscope_core::{Anomalies, AnomalyKind, EntryBody, LogEntry, TreeValue, INTERPRETED_PDU};

use crate::asn1::parse_tree;
use crate::classify::{
    is_assignment_line, is_blank, is_boundary_line, is_further_marker, is_interpreted_pdu_marker,
    is_metadata_line,
};
use crate::header::parse_header;

/// Route the body lines of one entry
///
/// Never fails: a stall or a broken value-notation block ends routing, the
/// remaining lines go to [`EntryBody::unparsed_tail`] and an anomaly is
/// recorded with `timestamp_ms`.
pub fn route_body<S: AsRef<str>>(
    lines: &[S],
    timestamp_ms: Option<i64>,
    anomalies: &mut Anomalies,
) -> EntryBody {
    BlockRouter::new(lines).run(timestamp_ms, anomalies)
}

/// Parse a complete line-group (header + body) into a [`LogEntry`]
///
/// Returns `None` and records [`AnomalyKind::UnrecognizedEntry`] when the
/// first line is not a valid header.
pub fn parse_entry<S: AsRef<str>>(group: &[S], anomalies: &mut Anomalies) -> Option<LogEntry> {
    let (first, body_lines) = group.split_first()?;
    let first = first.as_ref();

    let Some(header) = parse_header(first) else {
        anomalies.record(
            None,
            AnomalyKind::UnrecognizedEntry {
                first_line: first.to_string(),
            },
        );
        return None;
    };

    let body = if body_lines.iter().all(|l| is_blank(l.as_ref())) {
        None
    } else {
        Some(route_body(body_lines, Some(header.timestamp_ms), anomalies))
    };

    Some(LogEntry {
        date: header.date,
        time: header.time,
        timestamp_ms: header.timestamp_ms,
        tag: header.tag,
        log_code: header.log_code,
        log_name: header.log_name,
        log_subname: header.log_subname,
        body,
    })
}

/// Split a metadata line into `(key, value)` pairs
///
/// Commas inside parentheses do not separate pairs
/// (`Pkt Version = 27, RRC Release Number.Major.minor = 15.8.0 (Rel 15, ASN 8)`).
/// Segments without `=` are dropped.
pub fn split_metadata_pairs(line: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&line[start..]);

    segments
        .into_iter()
        .filter_map(|segment| segment.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

struct BlockRouter<'a, S> {
    lines: &'a [S],
    cursor: usize,
    body: EntryBody,
}

impl<'a, S: AsRef<str>> BlockRouter<'a, S> {
    fn new(lines: &'a [S]) -> Self {
        Self {
            lines,
            cursor: 0,
            body: EntryBody::default(),
        }
    }

    fn line(&self, i: usize) -> Option<&'a str> {
        self.lines.get(i).map(AsRef::as_ref)
    }

    fn skip_blank(&self, mut i: usize) -> usize {
        while self.line(i).is_some_and(is_blank) {
            i += 1;
        }
        i
    }

    fn run(mut self, timestamp_ms: Option<i64>, anomalies: &mut Anomalies) -> EntryBody {
        loop {
            self.cursor = self.skip_blank(self.cursor);
            if self.cursor >= self.lines.len() {
                break;
            }

            match self.step() {
                Ok(true) => {}
                Ok(false) => {
                    anomalies.record(
                        timestamp_ms,
                        AnomalyKind::RoutingStall {
                            remaining: self.lines.len() - self.cursor,
                            first_line: self.line(self.cursor).unwrap_or_default().to_string(),
                        },
                    );
                    self.stash_tail();
                    break;
                }
                Err(err) => {
                    let line = match err {
                        Error::StructuralParse { line, .. } => line,
                        other => other.to_string(),
                    };
                    anomalies.record(timestamp_ms, AnomalyKind::StructuralParseFailure { line });
                    self.stash_tail();
                    break;
                }
            }
        }
        self.body
    }

    /// Try each scanner in order; `Ok(false)` when none made progress
    fn step(&mut self) -> Result<bool> {
        let scans: [fn(&mut Self) -> Result<Option<usize>>; 3] =
            [Self::scan_metadata, Self::scan_pdu, Self::scan_further];
        for scan in scans {
            if let Some(next) = scan(self)? {
                self.cursor = next;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn stash_tail(&mut self) {
        self.body.unparsed_tail = self.lines[self.cursor..]
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        self.cursor = self.lines.len();
    }

    /// Consecutive `key = value` lines
    fn scan_metadata(&mut self) -> Result<Option<usize>> {
        let mut i = self.cursor;
        while let Some(line) = self.line(i) {
            if !is_metadata_line(line) || is_assignment_line(line) {
                break;
            }
            for (key, value) in split_metadata_pairs(line) {
                self.body.insert_metadata(key, value);
            }
            i += 1;
        }
        Ok((i > self.cursor).then_some(i))
    }

    /// `Interpreted PDU:` followed by a value-notation block
    fn scan_pdu(&mut self) -> Result<Option<usize>> {
        let marker = self.skip_blank(self.cursor);
        if !self.line(marker).is_some_and(is_interpreted_pdu_marker) {
            return Ok(None);
        }
        let (tree, next) = self.parse_after_marker(marker)?;
        self.body.insert_section(INTERPRETED_PDU, tree);
        Ok(Some(next))
    }

    /// `====` / `Further ...` / `====` followed, somewhere below, by a
    /// value-notation block
    ///
    /// Rolls back (consumes nothing) when no block follows the heading.
    fn scan_further(&mut self) -> Result<Option<usize>> {
        let open = self.skip_blank(self.cursor);
        if !self.line(open).is_some_and(is_boundary_line) {
            return Ok(None);
        }
        let heading = self.skip_blank(open + 1);
        let Some(heading_text) = self.line(heading).filter(|l| is_further_marker(l)) else {
            return Ok(None);
        };
        let section = heading_text.trim().trim_end_matches(':').trim().to_string();
        let close = self.skip_blank(heading + 1);
        if !self.line(close).is_some_and(is_boundary_line) {
            return Ok(None);
        }

        let mut i = close + 1;
        while let Some(line) = self.line(i) {
            if is_interpreted_pdu_marker(line) {
                let (tree, next) = self.parse_after_marker(i)?;
                self.body.insert_section(section, tree);
                return Ok(Some(next));
            }
            if is_assignment_line(line) {
                let parsed = parse_tree(self.lines, i)?;
                self.body.insert_section(section, parsed.value);
                return Ok(Some(i + parsed.consumed));
            }
            i += 1;
        }

        debug!("further-decoding section {:?} has no value block", section);
        Ok(None)
    }

    fn parse_after_marker(&self, marker: usize) -> Result<(TreeValue, usize)> {
        let start = self.skip_blank(marker + 1);
        let parsed = parse_tree(self.lines, start)?;
        Ok((parsed.value, start + parsed.consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrcscope_core::AnomalyCategory;

    const HEADER: &str = "2025 Dec 17  20:34:04.165  [A0]  0xB0C0  LTE RRC OTA Packet  --  PCCH / Paging";

    fn route(lines: &[&str]) -> (EntryBody, Anomalies) {
        let mut anomalies = Anomalies::new();
        let body = route_body(lines, Some(1), &mut anomalies);
        (body, anomalies)
    }

    #[test]
    fn test_split_metadata_pairs_respects_parentheses() {
        let pairs = split_metadata_pairs(
            "Pkt Version = 27, RRC Release Number.Major.minor = 15.8.0 (Rel 15, ASN 8)",
        );
        assert_eq!(
            pairs,
            vec![
                ("Pkt Version".to_string(), "27".to_string()),
                (
                    "RRC Release Number.Major.minor".to_string(),
                    "15.8.0 (Rel 15, ASN 8)".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_split_metadata_pairs_drops_segments_without_equals() {
        let pairs = split_metadata_pairs("a = 1, junk, b = x = y");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x = y".to_string())
            ]
        );
    }

    #[test]
    fn test_metadata_then_pdu() {
        let (body, anomalies) = route(&[
            "Pkt Version = 27, Radio Bearer ID = 0",
            "Physical Cell ID = 241, Freq = 5230",
            "",
            "Interpreted PDU:",
            "",
            "value PCCH-Message ::=",
            "{",
            "  message c1 : paging : {}",
            "}",
        ]);

        assert!(anomalies.is_empty());
        assert_eq!(body.metadata_value("Physical Cell ID"), Some("241"));
        assert_eq!(body.metadata.len(), 4);
        let pdu = body.pdu().expect("pdu section");
        assert_eq!(pdu.first_key(), Some("PCCH-Message"));
        assert!(body.unparsed_tail.is_empty());
    }

    #[test]
    fn test_further_decoding_section() {
        let (body, anomalies) = route(&[
            "Freq = 66936",
            "==================",
            "Further Decoding:",
            "==================",
            "value SystemInformationBlockType1-v890-IEs ::=",
            "{",
            "  lateNonCriticalExtension",
            "  {",
            "    freqBandIndicator-v9e0 66",
            "  }",
            "}",
        ]);

        assert!(anomalies.is_empty());
        let section = body.section("Further Decoding").expect("section");
        let inner = section
            .get("SystemInformationBlockType1-v890-IEs")
            .and_then(|v| v.get("lateNonCriticalExtension"))
            .and_then(|v| v.get("freqBandIndicator-v9e0"))
            .and_then(TreeValue::as_str);
        assert_eq!(inner, Some("66"));
    }

    #[test]
    fn test_further_decoding_with_pdu_marker() {
        let (body, anomalies) = route(&[
            "=====",
            "Further",
            "=====",
            "Interpreted PDU:",
            "value X ::=",
            "{",
            "  a 1",
            "}",
        ]);
        assert!(anomalies.is_empty());
        assert!(body.section("Further").is_some());
        assert!(body.pdu().is_none());
    }

    #[test]
    fn test_further_without_block_stalls() {
        let (body, anomalies) = route(&["=====", "Further Decoding:", "=====", "nothing here"]);
        assert_eq!(anomalies.count_of(AnomalyCategory::RoutingStall), 1);
        assert_eq!(body.unparsed_tail.len(), 4);
        assert_eq!(body.unparsed_tail[0], "=====");
    }

    #[test]
    fn test_unknown_block_goes_to_tail() {
        let (body, anomalies) = route(&["a = 1", "Log Codes Enabled:", "0x1FF0", "0xB0C0"]);
        assert_eq!(body.metadata_value("a"), Some("1"));
        assert_eq!(
            body.unparsed_tail,
            vec!["Log Codes Enabled:", "0x1FF0", "0xB0C0"]
        );
        match &anomalies.as_slice()[0].kind {
            AnomalyKind::RoutingStall {
                remaining,
                first_line,
            } => {
                assert_eq!(*remaining, 3);
                assert_eq!(first_line, "Log Codes Enabled:");
            }
            other => panic!("unexpected anomaly {other:?}"),
        }
        assert_eq!(anomalies.as_slice()[0].timestamp_ms, Some(1));
    }

    #[test]
    fn test_bad_root_records_structural_failure() {
        let (body, anomalies) = route(&[
            "a = 1",
            "Interpreted PDU:",
            "value ::=",
            "{",
            "}",
        ]);
        assert_eq!(anomalies.count_of(AnomalyCategory::StructuralParseFailure), 1);
        assert_eq!(body.metadata_value("a"), Some("1"));
        assert!(body.pdu().is_none());
        assert_eq!(body.unparsed_tail.first().map(String::as_str), Some("Interpreted PDU:"));
    }

    #[test]
    fn test_assignment_line_is_not_metadata() {
        let (body, anomalies) = route(&["value X ::=", "{", "}"]);
        assert!(body.metadata.is_empty());
        assert_eq!(anomalies.count_of(AnomalyCategory::RoutingStall), 1);
    }

    #[test]
    fn test_parse_entry_without_body() {
        let mut anomalies = Anomalies::new();
        let entry = parse_entry(&[HEADER], &mut anomalies).expect("entry");
        assert!(entry.body.is_none());
        assert_eq!(entry.log_subname, "PCCH / Paging");
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_parse_entry_rejects_bad_header() {
        let mut anomalies = Anomalies::new();
        assert!(parse_entry(&["not a header", "a = 1"], &mut anomalies).is_none());
        assert!(matches!(
            anomalies.as_slice()[0].kind,
            AnomalyKind::UnrecognizedEntry { .. }
        ));

        let empty: [&str; 0] = [];
        assert!(parse_entry(&empty, &mut anomalies).is_none());
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn test_parse_entry_routes_body() {
        let mut anomalies = Anomalies::new();
        let entry = parse_entry(
            &[
                HEADER,
                "Physical Cell ID = 171",
                "Interpreted PDU:",
                "value PCCH-Message ::=",
                "{",
                "  message c1 : paging : {}",
                "}",
            ],
            &mut anomalies,
        )
        .expect("entry");
        let body = entry.body.as_ref().expect("body");
        assert_eq!(body.metadata_value("Physical Cell ID"), Some("171"));
        assert!(entry.pdu().is_some());
    }
}
