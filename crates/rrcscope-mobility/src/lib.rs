//! # rrcscope-mobility - Serving Cells and Handover Intervals
//!
//! Correlates parsed RRC reconfigurations into the device's serving-cell
//! picture over time and the handover intervals between a reconfiguration
//! and its completion.
//!
//! Depends on [`rrcscope_core`] for domain types and [`rrcscope_parser`] for
//! reading traces.
//!
//! ## Public API
//!
//! ### Cells and Events (`cell`)
//! - [`Cell`], [`CellGroup`] - Primary or secondary serving cell
//! - [`HandoverEvent`], [`HandoverKind`] - One reconfiguration interval
//!
//! ### Tracking (`tracker`)
//! - [`MobilityTracker`] - Order-dependent state machine fed one entry at a time
//! - [`MobilityState`] - Primary cell, secondary cells, events and anomalies
//!
//! ### Configuration (`config`)
//! - [`TrackerConfig`] - Message dispatch table and signalling key stems
//! - [`load_tracker_config()`] - Load from TOML, falling back to defaults
//!
//! ### Pipeline (`pipeline`)
//! - [`process_logs()`], [`process_lines()`] - Trace in, [`MobilityReport`] out

pub mod cell;
pub mod config;
pub mod pipeline;
pub mod tracker;

pub use cell::{Cell, CellGroup, HandoverEvent, HandoverKind};
pub use config::{load_tracker_config, MessageRole, MessageRule, SignallingKeys, TrackerConfig};
pub use pipeline::{process_lines, process_logs, MobilityReport};
pub use tracker::{MobilityState, MobilityTracker};
