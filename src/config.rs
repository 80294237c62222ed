use std::{path::Path, time::Duration};

use eyre::{Context as _, Result};
use handover_carrier::CarrierType;
use serde::{Deserialize, Serialize};

/// Connection Handover 1.2
pub const DEFAULT_VERSION: u8 = 0x12;

pub const DEFAULT_SERVICE_NAME: &str = "urn:nfc:sn:handover";

/// Well known LLCP service access point of the handover service
pub const DEFAULT_SAP: u8 = 0x14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoverConfig {
    pub version: u8,
    pub service_name: String,
    pub sap: u8,

    /// Order in which carriers are offered and selected, most preferred first
    pub carrier_priority: Vec<CarrierType>,

    /// Upper bound on every wait for a radio event, `None` waits forever
    pub radio_event_timeout_secs: Option<u64>,

    /// Switch a radio back off when a negotiation that turned it on fails
    pub restore_radio_power: bool,

    pub notify_on_failure: bool,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            sap: DEFAULT_SAP,
            carrier_priority: vec![
                CarrierType::Bluetooth,
                CarrierType::WifiWps,
                CarrierType::WifiP2p,
            ],
            radio_event_timeout_secs: None,
            restore_radio_power: true,
            notify_on_failure: true,
        }
    }
}

impl HandoverConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("unable to parse handover config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("unable to read handover config at {}", path.display()))?;

        Self::from_json(&json)
    }

    pub fn radio_event_timeout(&self) -> Option<Duration> {
        self.radio_event_timeout_secs.map(Duration::from_secs)
    }

    /// Position of `carrier_type` in the priority list, unlisted types sort last
    pub fn priority_of(&self, carrier_type: CarrierType) -> usize {
        self.carrier_priority
            .iter()
            .position(|listed| *listed == carrier_type)
            .unwrap_or(usize::MAX)
    }
}
