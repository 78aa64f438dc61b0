//! # rrcscope-core - Core Domain Types
//!
//! Foundation crate for rrcscope. Provides the value-notation tree, parsed
//! log entries, anomaly records, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Trees (`tree`)
//! - [`TreeValue`] - Leaf / ordered mapping / list produced by the value-notation parser
//! - [`TreePath`], [`PathSegment`] - Locations returned by key search
//!
//! ### Entries (`entry`)
//! - [`LogEntry`] - One timestamped signalling-trace record
//! - [`EntryBody`] - Metadata pairs, parsed sections and unparsed tail of an entry
//!
//! ### Anomalies (`anomaly`)
//! - [`Anomaly`], [`AnomalyKind`], [`AnomalyCategory`] - Recoverable data problems
//! - [`Anomalies`] - Recording sink that also logs each anomaly
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Logging (`logging`)
//! - [`logging::init`], [`logging::init_with_dir`] - Install the rotating file logger
//! - [`logging::file_subscriber`] - The same subscriber, for scoped use

pub mod anomaly;
pub mod entry;
pub mod error;
pub mod logging;
pub mod tree;

/// Prelude for common imports used throughout all rrcscope crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use anomaly::{Anomalies, Anomaly, AnomalyCategory, AnomalyKind};
pub use entry::{EntryBody, LogEntry, INTERPRETED_PDU};
pub use error::{Error, Result, ResultExt};
pub use tree::{format_path, PathSegment, TreePath, TreeValue};
