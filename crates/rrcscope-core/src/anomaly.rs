//! Recoverable data anomalies.
//!
//! Nothing in this workspace aborts on malformed trace data. The parser and
//! the mobility tracker apply a deterministic repair (skip the group, attach a
//! diagnostic tail, ignore a removal, force-close an interval, skip an entry
//! that goes back in time) and record an
//! [`Anomaly`] so callers can audit what was repaired.

use std::fmt;

use serde::Serialize;

/// Coarse classification of an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCategory {
    /// A header or value-notation root line did not match its grammar
    StructuralParseFailure,

    /// The block router could not make progress through an entry body
    RoutingStall,

    /// Signalling content was inconsistent with the tracked mobility state
    SemanticAnomaly,
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// First line of a line-group is not a recognised entry header
    UnrecognizedEntry { first_line: String },

    /// A value-notation sub-tree could not be parsed
    StructuralParseFailure { line: String },

    /// Body lines left over after routing stopped making progress
    RoutingStall { remaining: usize, first_line: String },

    /// Mobility control info present without its handover type
    MissingHandoverType,

    /// A cell field was missing or not an integer
    MalformedCell { detail: String },

    /// A secondary cell release named an index that is not tracked
    UntrackedCellRelease { index: u32 },

    /// A new handover opened while the previous one was still open
    IncompleteHandover { begin_ts: i64 },

    /// A tracked entry is older than the previous tracked entry and was
    /// skipped
    OutOfOrderEntry { previous_ms: i64 },
}

impl AnomalyKind {
    pub fn category(&self) -> AnomalyCategory {
        match self {
            AnomalyKind::UnrecognizedEntry { .. } | AnomalyKind::StructuralParseFailure { .. } => {
                AnomalyCategory::StructuralParseFailure
            }
            AnomalyKind::RoutingStall { .. } => AnomalyCategory::RoutingStall,
            AnomalyKind::MissingHandoverType
            | AnomalyKind::MalformedCell { .. }
            | AnomalyKind::UntrackedCellRelease { .. }
            | AnomalyKind::IncompleteHandover { .. }
            | AnomalyKind::OutOfOrderEntry { .. } => AnomalyCategory::SemanticAnomaly,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::UnrecognizedEntry { first_line } => {
                write!(f, "unrecognized entry header: {first_line:?}")
            }
            AnomalyKind::StructuralParseFailure { line } => {
                write!(f, "invalid value-notation root line: {line:?}")
            }
            AnomalyKind::RoutingStall {
                remaining,
                first_line,
            } => write!(
                f,
                "routing stalled with {remaining} unparsed line(s), starting at {first_line:?}"
            ),
            AnomalyKind::MissingHandoverType => {
                write!(f, "mobility control info without handover type")
            }
            AnomalyKind::MalformedCell { detail } => write!(f, "malformed cell: {detail}"),
            AnomalyKind::UntrackedCellRelease { index } => write!(
                f,
                "release of untracked secondary cell {index} (add event likely missed)"
            ),
            AnomalyKind::IncompleteHandover { begin_ts } => write!(
                f,
                "handover opened at {begin_ts} never completed, force-closed"
            ),
            AnomalyKind::OutOfOrderEntry { previous_ms } => write!(
                f,
                "entry older than previous tracked entry at {previous_ms}, skipped"
            ),
        }
    }
}

/// A single recorded anomaly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    /// Timestamp of the entry that triggered it, if the header was parsed
    pub timestamp_ms: Option<i64>,

    #[serde(flatten)]
    pub kind: AnomalyKind,
}

impl Anomaly {
    pub fn new(timestamp_ms: Option<i64>, kind: AnomalyKind) -> Self {
        Self { timestamp_ms, kind }
    }

    pub fn category(&self) -> AnomalyCategory {
        self.kind.category()
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp_ms {
            Some(ts) => write!(f, "[{ts}] {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Recording sink for anomalies; every record is also logged at `warn` level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Anomalies(Vec<Anomaly>);

impl Anomalies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anomaly
    pub fn record(&mut self, timestamp_ms: Option<i64>, kind: AnomalyKind) {
        let anomaly = Anomaly::new(timestamp_ms, kind);
        tracing::warn!("{}", anomaly);
        self.0.push(anomaly);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of anomalies in a category
    pub fn count_of(&self, category: AnomalyCategory) -> usize {
        self.0.iter().filter(|a| a.category() == category).count()
    }

    /// Move every anomaly of `other` to the end of this sink
    pub fn append(&mut self, other: &mut Anomalies) {
        self.0.append(&mut other.0);
    }

    pub fn as_slice(&self) -> &[Anomaly] {
        &self.0
    }
}

impl IntoIterator for Anomalies {
    type Item = Anomaly;
    type IntoIter = std::vec::IntoIter<Anomaly>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
