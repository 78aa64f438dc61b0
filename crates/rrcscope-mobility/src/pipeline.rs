//! File-to-handover pipeline
//!
//! Reads a trace, parses every entry, keeps the ones inside an optional
//! timestamp window and feeds them to a [`MobilityTracker`] in file order.
//! A tracked entry older than its predecessor is skipped and recorded as
//! [`AnomalyKind::OutOfOrderEntry`]; file order is untrusted input.

use std::ops::Range;
use std::path::Path;

use rrcscope_core::prelude::*;
use rrcscope_core::{Anomalies, AnomalyKind};
use rrcscope_parser::{read_lines, TraceParser};
use serde::Serialize;

use crate::config::TrackerConfig;
use crate::tracker::{MobilityState, MobilityTracker};

/// Outcome of running a trace through the tracker
#[derive(Debug, Clone, Serialize)]
pub struct MobilityReport {
    pub state: MobilityState,

    /// Entries with a valid header, inside or outside the window
    pub entries_parsed: usize,

    /// Entries inside the window accepted by the tracker; skipped
    /// out-of-order entries are not counted
    pub entries_tracked: usize,

    /// Parser anomalies in file order, then tracker anomalies, then skipped
    /// out-of-order entries
    pub anomalies: Anomalies,
}

/// Run a trace file through the tracker
///
/// `window` is a half-open `[start, end)` range of epoch milliseconds.
pub fn process_logs(
    path: &Path,
    config: &TrackerConfig,
    window: Option<Range<i64>>,
) -> Result<MobilityReport> {
    let lines = read_lines(path)?;
    let report = process_lines(lines, config, window)?;
    info!(
        "{}: {} entries, {} handover events, {} anomalies",
        path.display(),
        report.entries_parsed,
        report.state.events.len(),
        report.anomalies.len()
    );
    Ok(report)
}

/// In-memory variant of [`process_logs`]
pub fn process_lines<L>(
    lines: L,
    config: &TrackerConfig,
    window: Option<Range<i64>>,
) -> Result<MobilityReport>
where
    L: IntoIterator<Item = String>,
{
    let mut parser = TraceParser::new(lines.into_iter());
    let mut tracker = MobilityTracker::new(config.clone());
    let mut entries_parsed = 0;
    let mut entries_tracked = 0;
    let mut skipped = Anomalies::new();

    for entry in parser.by_ref() {
        entries_parsed += 1;
        if window
            .as_ref()
            .is_some_and(|w| !w.contains(&entry.timestamp_ms))
        {
            continue;
        }
        match tracker.feed(&entry) {
            Ok(()) => entries_tracked += 1,
            Err(Error::OutOfOrder { previous_ms, .. }) => skipped.record(
                Some(entry.timestamp_ms),
                AnomalyKind::OutOfOrderEntry { previous_ms },
            ),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to track entry at {} ms", entry.timestamp_ms)
                })
            }
        }
    }

    let mut anomalies = parser.into_anomalies();
    let state = tracker.into_state();
    anomalies.append(&mut state.anomalies.clone());
    anomalies.append(&mut skipped);

    Ok(MobilityReport {
        state,
        entries_parsed,
        entries_tracked,
        anomalies,
    })
}
