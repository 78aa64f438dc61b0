//! Single-line predicates used by the segmenter and the block router.
//!
//! All functions are pure and total: any `&str` is a valid argument.

use regex::Regex;
use std::sync::LazyLock;

/// `YYYY Mon D[D] HH:MM:SS` at the start of a line
static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}\s+[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}")
        .expect("Invalid timestamp prefix regex")
});

/// Minimum run of `=` that counts as a block boundary
const BOUNDARY_MIN_LEN: usize = 4;

/// Marker line introducing a decoded PDU
pub const PDU_MARKER: &str = "Interpreted PDU:";

/// Token opening a "further decoding" section
pub const FURTHER_TOKEN: &str = "Further";

/// Value-notation assignment operator
pub const ASSIGNMENT: &str = "::=";

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Check if a line starts an entry (`2025 Dec 17  20:34:04.165 ...`)
pub fn is_timestamp_header(line: &str) -> bool {
    TIMESTAMP_PREFIX.is_match(line)
}

/// Check if a line carries `key = value` pairs
pub fn is_metadata_line(line: &str) -> bool {
    line.contains('=') && !line.contains("====")
}

/// Check if a line is a run of `=` characters and nothing else
pub fn is_boundary_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= BOUNDARY_MIN_LEN && trimmed.chars().all(|c| c == '=')
}

pub fn is_interpreted_pdu_marker(line: &str) -> bool {
    line.trim() == PDU_MARKER
}

/// Check if a line is the heading between the two boundaries of a
/// further-decoding section
///
/// Accepts a bare `Further` as well as headings such as `Further Decoding:`.
pub fn is_further_marker(line: &str) -> bool {
    line.split_whitespace().next() == Some(FURTHER_TOKEN)
}

/// Check if a line is a value-notation root (`value X ::=`)
pub fn is_assignment_line(line: &str) -> bool {
    line.contains(ASSIGNMENT)
}
