//! Serving cells and handover intervals

use std::fmt;

use serde::{Serialize, Serializer};

/// Carrier-aggregation role of a serving cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellGroup {
    Primary,
    Secondary,
}

/// A serving cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// `sCellIndex` of a secondary cell; `None` for the primary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    pub group: CellGroup,
    pub physical_cell_id: u32,

    /// Downlink EARFCN
    pub carrier_frequency: u32,
}

impl Cell {
    pub fn primary(physical_cell_id: u32, carrier_frequency: u32) -> Self {
        Self {
            index: None,
            group: CellGroup::Primary,
            physical_cell_id,
            carrier_frequency,
        }
    }

    pub fn secondary(index: u32, physical_cell_id: u32, carrier_frequency: u32) -> Self {
        Self {
            index: Some(index),
            group: CellGroup::Secondary,
            physical_cell_id,
            carrier_frequency,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(
                f,
                "{}, {}, {}",
                index, self.physical_cell_id, self.carrier_frequency
            ),
            None => write!(f, "{}, {}", self.physical_cell_id, self.carrier_frequency),
        }
    }
}

/// Handover type carried by a reconfiguration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandoverKind {
    /// `intraLTE`: primary cell change within LTE
    IntraFrequency,

    /// Secondary cell changes only
    IntraSecondaryGroup,

    /// Any other handover-type tag (e.g. `interRAT`), kept verbatim
    Other(String),
}

impl HandoverKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "intraLTE" => HandoverKind::IntraFrequency,
            "intraSCG" => HandoverKind::IntraSecondaryGroup,
            other => HandoverKind::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            HandoverKind::IntraFrequency => "intraLTE",
            HandoverKind::IntraSecondaryGroup => "intraSCG",
            HandoverKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for HandoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Serialize for HandoverKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

/// One reconfiguration interval, open until the completion message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoverEvent {
    pub begin_ts: i64,
    pub end_ts: Option<i64>,
    pub kind: HandoverKind,

    /// Physical cell ids that became serving cells
    pub added_cell_ids: Vec<u32>,

    /// Physical cell ids that stopped serving
    pub removed_cell_ids: Vec<u32>,
}

impl HandoverEvent {
    pub fn is_open(&self) -> bool {
        self.end_ts.is_none()
    }

    /// Interval length once closed
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_ts.map(|end| end - self.begin_ts)
    }
}

impl fmt::Display for HandoverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ids: &[u32]| {
            ids.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let end = self
            .end_ts
            .map_or_else(|| "open".to_string(), |end| end.to_string());
        write!(
            f,
            "{}, {}, {}, ({}), ({})",
            self.begin_ts,
            end,
            self.kind,
            join(&self.added_cell_ids),
            join(&self.removed_cell_ids)
        )
    }
}
