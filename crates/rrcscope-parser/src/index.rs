//! Entry lookup by message family and name.

use std::collections::BTreeMap;

use rrcscope_core::LogEntry;

/// Parsed entries grouped by `log_code`, then by display name
/// (subname when present, otherwise the log name)
///
/// Entries keep their input order within a group.
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    by_code: BTreeMap<String, BTreeMap<String, Vec<LogEntry>>>,
    len: usize,
}

impl EntryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: LogEntry) {
        let name = entry.display_name().to_string();
        self.by_code
            .entry(entry.log_code.clone())
            .or_default()
            .entry(name)
            .or_default()
            .push(entry);
        self.len += 1;
    }

    /// Entries with this code and display name, in input order
    pub fn get(&self, log_code: &str, name: &str) -> &[LogEntry] {
        self.by_code
            .get(log_code)
            .and_then(|names| names.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct log codes, sorted
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.by_code.keys().map(String::as_str)
    }

    /// Distinct display names seen under a code, sorted
    pub fn names(&self, log_code: &str) -> impl Iterator<Item = &str> {
        self.by_code
            .get(log_code)
            .into_iter()
            .flat_map(|names| names.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<LogEntry> for EntryIndex {
    fn from_iter<T: IntoIterator<Item = LogEntry>>(iter: T) -> Self {
        let mut index = EntryIndex::new();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;

    fn entry(header: &str) -> LogEntry {
        let h = parse_header(header).unwrap();
        LogEntry {
            date: h.date,
            time: h.time,
            timestamp_ms: h.timestamp_ms,
            tag: h.tag,
            log_code: h.log_code,
            log_name: h.log_name,
            log_subname: h.log_subname,
            body: None,
        }
    }

    #[test]
    fn test_groups_by_code_and_name() {
        let index: EntryIndex = [
            "2025 Dec 17  20:34:04.165  [A0]  0xB0C0  LTE RRC OTA Packet  --  PCCH / Paging",
            "2025 Dec 17  20:34:04.200  [EC]  0x1FF0  Diagnostic Response Status",
            "2025 Dec 17  20:34:04.300  [A0]  0xB0C0  LTE RRC OTA Packet  --  PCCH / Paging",
            "2025 Dec 17  20:34:04.400  [A0]  0xB0C0  LTE RRC OTA Packet  --  UL_DCCH / MeasurementReport",
        ]
        .into_iter()
        .map(entry)
        .collect();

        assert_eq!(index.len(), 4);
        assert_eq!(index.codes().collect::<Vec<_>>(), vec!["0x1FF0", "0xB0C0"]);

        let paging = index.get("0xB0C0", "PCCH / Paging");
        assert_eq!(paging.len(), 2);
        assert!(paging[0].timestamp_ms < paging[1].timestamp_ms);

        assert_eq!(index.get("0x1FF0", "Diagnostic Response Status").len(), 1);
        assert!(index.get("0xB0C0", "missing").is_empty());
        assert!(index.get("0xFFFF", "PCCH / Paging").is_empty());
        assert_eq!(index.names("0xB0C0").count(), 2);
    }
}
