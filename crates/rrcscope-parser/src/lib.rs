//! # rrcscope-parser - Trace Segmentation and Value-Notation Parsing
//!
//! Turns the free-text RRC signalling traces written by modem diagnostic
//! tools into [`LogEntry`](rrcscope_core::LogEntry) records.
//!
//! Depends on [`rrcscope_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Line Handling
//! - [`read_lines()`] - Lossy UTF-8 file reading
//! - [`classify`] - Single-line predicates (timestamp header, boundary, markers)
//! - [`EntrySegmenter`] - Lazy grouping of lines into one group per entry
//!
//! ### Entry Parsing
//! - [`parse_header()`] - Timestamp / tag / code / name header line
//! - [`parse_entry()`], [`route_body()`] - Metadata, PDU and further-decoding blocks
//! - [`parse_tree()`], [`reclassify()`] - Indentation-driven value-notation parser
//!
//! ### Whole Traces
//! - [`TraceParser`] - Iterator of entries over a line source
//! - [`parse_lines()`], [`parse_file()`] - Collect entries and anomalies
//! - [`EntryIndex`] - Entries grouped by log code and name

pub mod asn1;
pub mod classify;
pub mod header;
pub mod index;
pub mod reader;
pub mod router;
pub mod segment;
pub mod trace;

pub use asn1::{parse_tree, parse_value_notation, reclassify, ParsedTree};
pub use header::{parse_header, EntryHeader};
pub use index::EntryIndex;
pub use reader::{decode_lines, read_lines};
pub use router::{parse_entry, route_body, split_metadata_pairs};
pub use segment::{segment_lines, EntrySegmenter};
pub use trace::{parse_file, parse_lines, ParsedLog, TraceParser};
