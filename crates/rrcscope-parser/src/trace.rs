//! Whole-trace parsing: segmentation plus per-entry parsing.

use std::path::Path;

use rrcscope_core::prelude::*;
use rrcscope_core::{Anomalies, LogEntry};

use crate::reader::read_lines;
use crate::router::parse_entry;
use crate::segment::EntrySegmenter;

/// Lazy iterator of parsed entries over a line source
///
/// Groups whose header does not parse are skipped; the anomalies they (and
/// routing problems) produce accumulate in [`anomalies`](Self::anomalies).
#[derive(Debug)]
pub struct TraceParser<I: Iterator<Item = String>> {
    groups: EntrySegmenter<I>,
    anomalies: Anomalies,
}

impl<I: Iterator<Item = String>> TraceParser<I> {
    pub fn new(lines: I) -> Self {
        Self {
            groups: EntrySegmenter::new(lines),
            anomalies: Anomalies::new(),
        }
    }

    pub fn anomalies(&self) -> &Anomalies {
        &self.anomalies
    }

    pub fn into_anomalies(self) -> Anomalies {
        self.anomalies
    }
}

impl<I: Iterator<Item = String>> Iterator for TraceParser<I> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        for group in self.groups.by_ref() {
            if let Some(entry) = parse_entry(&group, &mut self.anomalies) {
                return Some(entry);
            }
        }
        None
    }
}

/// A fully parsed trace
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub entries: Vec<LogEntry>,
    pub anomalies: Anomalies,
}

/// Parse an in-memory sequence of lines
pub fn parse_lines<L>(lines: L) -> ParsedLog
where
    L: IntoIterator<Item = String>,
{
    let mut parser = TraceParser::new(lines.into_iter());
    let entries: Vec<LogEntry> = parser.by_ref().collect();
    let anomalies = parser.into_anomalies();
    debug!(
        "Parsed {} entries ({} anomalies)",
        entries.len(),
        anomalies.len()
    );
    ParsedLog { entries, anomalies }
}

/// Read and parse a trace file
pub fn parse_file(path: &Path) -> Result<ParsedLog> {
    let lines = read_lines(path)?;
    Ok(parse_lines(lines))
}
