//! rrcscope Library
//!
//! Parses modem RRC signalling traces (ASN.1 value-notation dumps) into
//! structured entries and tracks serving-cell changes as handover intervals.

use std::path::Path;

pub use rrcscope_core as core;
pub use rrcscope_mobility as mobility;
pub use rrcscope_parser as parser;

pub use rrcscope_core::{
    Anomalies, Anomaly, AnomalyCategory, AnomalyKind, EntryBody, Error, LogEntry, Result,
    TreeValue,
};
pub use rrcscope_mobility::{
    load_tracker_config, process_lines, process_logs, Cell, HandoverEvent, HandoverKind,
    MobilityReport, MobilityState, MobilityTracker, TrackerConfig,
};
pub use rrcscope_parser::{parse_file, parse_lines, EntryIndex, ParsedLog};

/// Run a trace through the tracker
///
/// The tracker config is read from `config_path` when given (falling back to
/// defaults if it is missing or invalid).
pub fn analyze(trace: &Path, config_path: Option<&Path>) -> Result<MobilityReport> {
    let config = config_path.map(load_tracker_config).unwrap_or_default();
    tracing::debug!(
        "Analyzing {} with {} message rule(s)",
        trace.display(),
        config.messages.len()
    );
    process_logs(trace, &config, None)
}
