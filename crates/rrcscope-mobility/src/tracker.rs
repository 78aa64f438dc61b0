//! Mobility state tracking
//!
//! [`MobilityTracker`] consumes parsed entries in timestamp order and keeps
//! the serving-cell picture (one primary cell, secondary cells by index)
//! together with the handover intervals derived from RRC reconfigurations.
//!
//! A reconfiguration is applied in a fixed order: primary reassignment from
//! mobility control info, then every secondary release list, then every
//! secondary add/modify list. Releasing first matters because a new
//! secondary cell usually reuses the index of the one it replaces.

use std::collections::BTreeMap;
use std::fmt;

use rrcscope_core::prelude::*;
use rrcscope_core::{Anomalies, AnomalyKind, LogEntry, TreeValue};
use serde::Serialize;

use crate::cell::{Cell, HandoverEvent, HandoverKind};
use crate::config::{MessageRole, SignallingKeys, TrackerConfig};

/// Serving cells and handover history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MobilityState {
    pub primary: Option<Cell>,

    /// Secondary cells keyed by `sCellIndex`
    pub secondaries: BTreeMap<u32, Cell>,

    /// Handover intervals in begin order; at most the last one is open
    pub events: Vec<HandoverEvent>,

    pub anomalies: Anomalies,

    /// Timestamp of the last entry the tracker acted on
    pub last_timestamp_ms: Option<i64>,
}

impl MobilityState {
    /// Durations of closed events, in event order
    pub fn completed_durations_ms(&self) -> Vec<i64> {
        self.events
            .iter()
            .filter_map(HandoverEvent::duration_ms)
            .collect()
    }

    /// Mean duration of closed events
    pub fn average_handover_ms(&self) -> Option<f64> {
        let durations = self.completed_durations_ms();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
    }

    pub fn open_event(&self) -> Option<&HandoverEvent> {
        self.events.last().filter(|e| e.is_open())
    }
}

impl fmt::Display for MobilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats ======")?;
        match &self.primary {
            Some(cell) => writeln!(f, "PCell(physCellId, dlCarrierFreq): {}", cell)?,
            None => writeln!(f, "PCell(physCellId, dlCarrierFreq): unknown")?,
        }
        writeln!(f, "SCell(index, physCellId, dlCarrierFreq):")?;
        for cell in self.secondaries.values() {
            writeln!(f, "{}", cell)?;
        }
        write!(f, "HO Events: {}", self.events.len())?;
        if let Some(avg) = self.average_handover_ms() {
            write!(f, " (avg {:.1} ms)", avg)?;
        }
        Ok(())
    }
}

/// Cell changes collected while applying one reconfiguration
#[derive(Debug, Default)]
struct CellChanges {
    added: Vec<u32>,
    removed: Vec<u32>,
    handover: Option<HandoverKind>,
}

impl CellChanges {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Order-dependent state machine over RRC reconfiguration entries
#[derive(Debug, Clone)]
pub struct MobilityTracker {
    config: TrackerConfig,
    state: MobilityState,
}

impl Default for MobilityTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl MobilityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: MobilityState::default(),
        }
    }

    /// Apply one entry
    ///
    /// Entries outside the configured message table are ignored. Data
    /// problems are recorded as anomalies and never fail the call. A
    /// reconfiguration with mobility control info but no handover type keeps
    /// its primary cell and still applies its secondary cell lists.
    ///
    /// # Errors
    /// [`Error::OutOfOrder`] if the entry is older than the previous tracked
    /// entry; the state is left untouched.
    pub fn feed(&mut self, entry: &LogEntry) -> Result<()> {
        let Some(role) = self.config.role_of(entry) else {
            return Ok(());
        };

        if let Some(previous_ms) = self.state.last_timestamp_ms {
            if entry.timestamp_ms < previous_ms {
                return Err(Error::OutOfOrder {
                    previous_ms,
                    current_ms: entry.timestamp_ms,
                });
            }
        }
        self.state.last_timestamp_ms = Some(entry.timestamp_ms);

        match role {
            MessageRole::ReconfigurationComplete => self.complete(entry.timestamp_ms),
            MessageRole::Reconfiguration => self.reconfigure(entry),
        }
        Ok(())
    }

    pub fn state(&self) -> &MobilityState {
        &self.state
    }

    pub fn into_state(self) -> MobilityState {
        self.state
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn primary_cell(&self) -> Option<&Cell> {
        self.state.primary.as_ref()
    }

    pub fn secondary_cells(&self) -> &BTreeMap<u32, Cell> {
        &self.state.secondaries
    }

    pub fn events(&self) -> &[HandoverEvent] {
        &self.state.events
    }

    pub fn anomalies(&self) -> &Anomalies {
        &self.state.anomalies
    }

    pub fn completed_durations_ms(&self) -> Vec<i64> {
        self.state.completed_durations_ms()
    }

    pub fn average_handover_ms(&self) -> Option<f64> {
        self.state.average_handover_ms()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Message handlers
    // ─────────────────────────────────────────────────────────────────────────

    fn complete(&mut self, ts: i64) {
        match self.state.events.last_mut() {
            Some(event) if event.is_open() => {
                event.end_ts = Some(ts);
                info!(
                    "Handover {} completed in {} ms",
                    event.kind,
                    ts - event.begin_ts
                );
            }
            _ => debug!("Reconfiguration complete at {} with no open handover", ts),
        }
    }

    fn reconfigure(&mut self, entry: &LogEntry) {
        let ts = entry.timestamp_ms;
        let Some(pdu) = entry.pdu() else {
            debug!("Reconfiguration at {} has no decoded PDU", ts);
            return;
        };

        let mut changes = CellChanges::default();
        self.reassign_primary(entry, pdu, &mut changes);
        self.release_secondaries(ts, pdu, &mut changes);
        self.add_secondaries(ts, pdu, &mut changes);

        if changes.is_empty() {
            return;
        }

        if let Some(open) = self.state.events.last_mut().filter(|e| e.is_open()) {
            open.end_ts = Some(ts);
            self.state.anomalies.record(
                Some(ts),
                AnomalyKind::IncompleteHandover {
                    begin_ts: open.begin_ts,
                },
            );
        }

        let event = HandoverEvent {
            begin_ts: ts,
            end_ts: None,
            kind: changes
                .handover
                .unwrap_or(HandoverKind::IntraSecondaryGroup),
            added_cell_ids: changes.added,
            removed_cell_ids: changes.removed,
        };
        info!("Handover opened: {}", event);
        self.state.events.push(event);
    }

    /// Move the primary cell to the target named in mobility control info
    ///
    /// Without a handover type only the primary update is skipped (recorded
    /// as [`AnomalyKind::MissingHandoverType`]); the secondary lists of the
    /// same entry are still applied; the rest of the entry is deliberately
    /// not abandoned.
    fn reassign_primary(&mut self, entry: &LogEntry, pdu: &TreeValue, changes: &mut CellChanges) {
        let ts = entry.timestamp_ms;
        let keys = &self.config.keys;

        let Some(block) = pdu
            .find_keys(&keys.mobility_control_info)
            .first()
            .and_then(|path| pdu.at(path))
        else {
            return;
        };

        let Some(tag) = pdu
            .find_values(&keys.handover_type)
            .into_iter()
            .find_map(TreeValue::first_key)
        else {
            self.state
                .anomalies
                .record(Some(ts), AnomalyKind::MissingHandoverType);
            return;
        };

        let Some(pci) = block
            .field(&keys.target_phys_cell_id)
            .and_then(TreeValue::parse_leaf::<u32>)
        else {
            self.state.anomalies.record(
                Some(ts),
                AnomalyKind::MalformedCell {
                    detail: format!(
                        "{} without integer {}",
                        keys.mobility_control_info, keys.target_phys_cell_id
                    ),
                },
            );
            return;
        };

        let Some(frequency) = target_frequency(keys, block)
            .or_else(|| self.state.primary.as_ref().map(|c| c.carrier_frequency))
            .or_else(|| arrival_frequency(keys, entry))
        else {
            self.state.anomalies.record(
                Some(ts),
                AnomalyKind::MalformedCell {
                    detail: format!("no carrier frequency for target cell {}", pci),
                },
            );
            return;
        };

        if let Some(old) = self.state.primary.take() {
            changes.removed.push(old.physical_cell_id);
        }
        changes.added.push(pci);
        changes.handover = Some(HandoverKind::from_tag(tag));
        debug!("Primary cell -> {} @ {} ({})", pci, frequency, tag);
        self.state.primary = Some(Cell::primary(pci, frequency));
    }

    fn release_secondaries(&mut self, ts: i64, pdu: &TreeValue, changes: &mut CellChanges) {
        for list in pdu.find_values(&self.config.keys.scell_release_list) {
            for item in list.elements() {
                let Some(index) = item.parse_leaf::<u32>() else {
                    self.state.anomalies.record(
                        Some(ts),
                        AnomalyKind::MalformedCell {
                            detail: format!(
                                "secondary release element {:?} is not an index",
                                item
                            ),
                        },
                    );
                    continue;
                };

                match self.state.secondaries.remove(&index) {
                    Some(cell) => {
                        debug!("Released secondary cell {}", cell);
                        changes.removed.push(cell.physical_cell_id);
                    }
                    None => self
                        .state
                        .anomalies
                        .record(Some(ts), AnomalyKind::UntrackedCellRelease { index }),
                }
            }
        }
    }

    fn add_secondaries(&mut self, ts: i64, pdu: &TreeValue, changes: &mut CellChanges) {
        let keys = &self.config.keys;

        for list in pdu.find_values(&keys.scell_add_mod_list) {
            // A lone element with an empty sub-block collapses into the list
            let items = if list.is_reclassified_block(&keys.scell_index) {
                std::slice::from_ref(list).iter()
            } else {
                list.elements()
            };

            for item in items {
                let Some(index) = item
                    .field(&keys.scell_index)
                    .and_then(TreeValue::parse_leaf::<u32>)
                else {
                    self.state.anomalies.record(
                        Some(ts),
                        AnomalyKind::MalformedCell {
                            detail: format!(
                                "secondary add/modify element without integer {}",
                                keys.scell_index
                            ),
                        },
                    );
                    continue;
                };

                let Some(identity) = item.field(&keys.cell_identification) else {
                    debug!("Secondary cell {} reconfigured in place", index);
                    continue;
                };

                let pci = identity
                    .field(&keys.phys_cell_id)
                    .and_then(TreeValue::parse_leaf::<u32>);
                let frequency = identity
                    .field(&keys.carrier_freq)
                    .and_then(TreeValue::parse_leaf::<u32>);

                match (pci, frequency) {
                    (Some(pci), Some(frequency)) => {
                        let cell = Cell::secondary(index, pci, frequency);
                        debug!("Added secondary cell {}", cell);
                        self.state.secondaries.insert(index, cell);
                        changes.added.push(pci);
                    }
                    _ => self.state.anomalies.record(
                        Some(ts),
                        AnomalyKind::MalformedCell {
                            detail: format!(
                                "secondary cell {} with incomplete identification",
                                index
                            ),
                        },
                    ),
                }
            }
        }
    }
}

/// Carrier of the target cell named in mobility control info
///
/// Extension fields (`dl-CarrierFreq-v9e0`) follow the base field and carry
/// the real EARFCN when it does not fit the base range, so the last integer
/// wins.
fn target_frequency(keys: &SignallingKeys, block: &TreeValue) -> Option<u32> {
    block
        .find_values(&keys.carrier_freq)
        .into_iter()
        .filter_map(TreeValue::parse_leaf::<u32>)
        .last()
}

/// Frequency the reconfiguration itself was received on
fn arrival_frequency(keys: &SignallingKeys, entry: &LogEntry) -> Option<u32> {
    entry
        .body
        .as_ref()?
        .metadata_value(&keys.frequency_metadata)?
        .trim()
        .parse()
        .ok()
}
