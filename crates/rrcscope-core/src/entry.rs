//! Parsed signalling-trace records

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::tree::TreeValue;

/// Section name under which the decoded PDU of an entry is stored
pub const INTERPRETED_PDU: &str = "Interpreted PDU";

/// One signalling-trace record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Calendar day from the header
    pub date: NaiveDate,

    /// Time of day, millisecond precision
    pub time: NaiveTime,

    /// `date` + `time` interpreted as UTC, in epoch milliseconds
    pub timestamp_ms: i64,

    /// Bracketed two-hex-digit classification code, e.g. `"A0"`
    pub tag: String,

    /// Message-family code, e.g. `"0xB0C0"`
    pub log_code: String,

    /// Free-text name, e.g. `"LTE RRC OTA Packet"`
    pub log_name: String,

    /// Message sub-type after `"  --  "`, empty when the header has none
    pub log_subname: String,

    /// Routed body, `None` when the entry is a header line only
    pub body: Option<EntryBody>,
}

impl LogEntry {
    /// The decoded PDU tree, if the body had one
    pub fn pdu(&self) -> Option<&TreeValue> {
        self.body.as_ref().and_then(EntryBody::pdu)
    }

    /// Subname when present, otherwise the name
    pub fn display_name(&self) -> &str {
        if self.log_subname.is_empty() {
            &self.log_name
        } else {
            &self.log_subname
        }
    }
}

/// Everything after the header line of an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryBody {
    /// `key = value` pairs in first-seen order
    pub metadata: Vec<(String, String)>,

    /// Parsed value-notation blocks keyed by section name
    pub sections: Vec<(String, TreeValue)>,

    /// Lines the router could not assign to any block
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unparsed_tail: Vec<String>,
}

impl EntryBody {
    /// Insert a metadata pair; a repeated key replaces the earlier value
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.metadata.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.metadata.push((key, value)),
        }
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert a parsed section; a repeated name replaces the earlier tree
    pub fn insert_section(&mut self, name: impl Into<String>, value: TreeValue) {
        let name = name.into();
        match self.sections.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.sections.push((name, value)),
        }
    }

    pub fn section(&self, name: &str) -> Option<&TreeValue> {
        self.sections
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn pdu(&self) -> Option<&TreeValue> {
        self.section(INTERPRETED_PDU)
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.sections.is_empty() && self.unparsed_tail.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(subname: &str) -> LogEntry {
        LogEntry {
            date: NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(),
            time: NaiveTime::from_hms_milli_opt(20, 34, 4, 165).unwrap(),
            timestamp_ms: 1_766_003_644_165,
            tag: "A0".into(),
            log_code: "0xB0C0".into(),
            log_name: "LTE RRC OTA Packet".into(),
            log_subname: subname.into(),
            body: None,
        }
    }

    #[test]
    fn test_display_name_prefers_subname() {
        assert_eq!(
            entry("DL_DCCH / RRCConnectionReconfiguration").display_name(),
            "DL_DCCH / RRCConnectionReconfiguration"
        );
        assert_eq!(entry("").display_name(), "LTE RRC OTA Packet");
    }

    #[test]
    fn test_metadata_replaces_duplicate_key() {
        let mut body = EntryBody::default();
        body.insert_metadata("Freq", "5230");
        body.insert_metadata("Physical Cell ID", "171");
        body.insert_metadata("Freq", "66936");

        assert_eq!(body.metadata.len(), 2);
        assert_eq!(body.metadata_value("Freq"), Some("66936"));
        assert_eq!(body.metadata[0].0, "Freq");
    }

    #[test]
    fn test_pdu_lookup() {
        let mut body = EntryBody::default();
        assert!(body.pdu().is_none());
        body.insert_section(INTERPRETED_PDU, TreeValue::leaf("x"));

        let mut e = entry("");
        e.body = Some(body);
        assert_eq!(e.pdu(), Some(&TreeValue::leaf("x")));
    }
}
