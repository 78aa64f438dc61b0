//! Tracker configuration
//!
//! Which log messages drive the tracker, and the signalling key stems it
//! looks for inside their PDUs. Defaults cover LTE RRC OTA packets (`0xB0C0`);
//! a TOML file can override both tables:
//!
//! ```toml
//! [[messages]]
//! log_code = "0xB0C0"
//! subname = "DL_DCCH / RRCConnectionReconfiguration"
//! role = "reconfiguration"
//!
//! [keys]
//! scell_add_mod_list = "sCellToAddModList"
//! ```

use std::path::Path;

use rrcscope_core::prelude::*;
use rrcscope_core::LogEntry;
use serde::{Deserialize, Serialize};

/// LTE RRC OTA packet log code
pub const LTE_RRC_OTA: &str = "0xB0C0";

/// What a matching message means to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Carries mobility control info and cell list changes; opens events
    Reconfiguration,

    /// Acknowledges the last reconfiguration; closes the open event
    ReconfigurationComplete,
}

/// One row of the message dispatch table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageRule {
    pub log_code: String,
    pub subname: String,
    pub role: MessageRole,
}

impl MessageRule {
    pub fn new(log_code: &str, subname: &str, role: MessageRole) -> Self {
        Self {
            log_code: log_code.to_string(),
            subname: subname.to_string(),
            role,
        }
    }

    fn matches(&self, entry: &LogEntry) -> bool {
        self.log_code.eq_ignore_ascii_case(&entry.log_code) && self.subname == entry.log_subname
    }
}

/// Key stems matched against PDU keys
///
/// Keys in decoded PDUs carry release suffixes (`sCellIndex-r10`,
/// `dl-CarrierFreq-v9e0`); list and block keys are found by substring search,
/// element fields by prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SignallingKeys {
    pub mobility_control_info: String,
    pub handover_type: String,
    pub target_phys_cell_id: String,
    pub carrier_freq: String,
    pub scell_release_list: String,
    pub scell_add_mod_list: String,
    pub scell_index: String,
    pub cell_identification: String,
    pub phys_cell_id: String,

    /// Entry metadata field holding the frequency the message arrived on
    pub frequency_metadata: String,
}

impl Default for SignallingKeys {
    fn default() -> Self {
        Self {
            mobility_control_info: "mobilityControlInfo".to_string(),
            handover_type: "handoverType".to_string(),
            target_phys_cell_id: "targetPhysCellId".to_string(),
            carrier_freq: "dl-CarrierFreq".to_string(),
            scell_release_list: "sCellToReleaseList".to_string(),
            scell_add_mod_list: "sCellToAddModList".to_string(),
            scell_index: "sCellIndex".to_string(),
            cell_identification: "cellIdentification".to_string(),
            phys_cell_id: "physCellId".to_string(),
            frequency_metadata: "Freq".to_string(),
        }
    }
}

impl SignallingKeys {
    fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("mobility_control_info", &self.mobility_control_info),
            ("handover_type", &self.handover_type),
            ("target_phys_cell_id", &self.target_phys_cell_id),
            ("carrier_freq", &self.carrier_freq),
            ("scell_release_list", &self.scell_release_list),
            ("scell_add_mod_list", &self.scell_add_mod_list),
            ("scell_index", &self.scell_index),
            ("cell_identification", &self.cell_identification),
            ("phys_cell_id", &self.phys_cell_id),
            ("frequency_metadata", &self.frequency_metadata),
        ]
    }
}

/// Constructor configuration for [`MobilityTracker`](crate::MobilityTracker)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default = "default_messages")]
    pub messages: Vec<MessageRule>,

    #[serde(default)]
    pub keys: SignallingKeys,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            messages: default_messages(),
            keys: SignallingKeys::default(),
        }
    }
}

fn default_messages() -> Vec<MessageRule> {
    vec![
        MessageRule::new(
            LTE_RRC_OTA,
            "DL_DCCH / RRCConnectionReconfiguration",
            MessageRole::Reconfiguration,
        ),
        MessageRule::new(
            LTE_RRC_OTA,
            "UL_DCCH / RRCConnectionReconfigurationComplete",
            MessageRole::ReconfigurationComplete,
        ),
    ]
}

impl TrackerConfig {
    /// Parse a TOML document; omitted tables fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Invalid tracker config: {}", e)))
    }

    /// Role of an entry, `None` when the tracker should ignore it
    pub fn role_of(&self, entry: &LogEntry) -> Option<MessageRole> {
        self.messages
            .iter()
            .find(|rule| rule.matches(entry))
            .map(|rule| rule.role)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if !self
            .messages
            .iter()
            .any(|rule| rule.role == MessageRole::Reconfiguration)
        {
            return Err(Error::config_invalid(
                "message table has no reconfiguration rule",
            ));
        }

        for rule in &self.messages {
            if !is_log_code(&rule.log_code) {
                return Err(Error::config_invalid(format!(
                    "log_code {:?} is not 0x followed by four hex digits",
                    rule.log_code
                )));
            }
            if rule.subname.trim().is_empty() {
                return Err(Error::config_invalid(format!(
                    "empty subname for log_code {}",
                    rule.log_code
                )));
            }
        }

        if let Some((name, _)) = self.keys.fields().iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::config_invalid(format!("keys.{} is empty", name)));
        }

        Ok(())
    }
}

fn is_log_code(code: &str) -> bool {
    code.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Load a tracker config file
///
/// A missing, unreadable, malformed or invalid file yields the defaults.
pub fn load_tracker_config(path: &Path) -> TrackerConfig {
    if !path.exists() {
        debug!("No tracker config at {:?}, using defaults", path);
        return TrackerConfig::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            return TrackerConfig::default();
        }
    };

    match TrackerConfig::from_toml_str(&content).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => {
            debug!("Loaded tracker config from {:?}", path);
            config
        }
        Err(e) => {
            warn!("Ignoring tracker config {:?}: {}", path, e);
            TrackerConfig::default()
        }
    }
}
