use handover_ndef::{NdefRecord, Tnf};
use serde::{Deserialize, Serialize};

use crate::registry;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CarrierType {
    Bluetooth,
    WifiWps,
    WifiP2p,
    Unknown,
}

impl CarrierType {
    /// Classify a carrier record by its media type
    pub fn from_record(record: &NdefRecord) -> Self {
        if record.tnf != Tnf::MediaType {
            return Self::Unknown;
        }

        let Some(mime) = record.type_str() else {
            return Self::Unknown;
        };

        let is = |expected: &str| mime.eq_ignore_ascii_case(expected);

        if is(registry::BLUETOOTH_OOB) {
            Self::Bluetooth
        } else if is(registry::WIFI_WSC) || is(registry::WIFI_WSC_IBSS) {
            Self::WifiWps
        } else if is(registry::WIFI_P2P) {
            Self::WifiP2p
        } else {
            Self::Unknown
        }
    }

    /// The media type written for carriers of this type
    pub fn record_type(self) -> Option<&'static str> {
        match self {
            Self::Bluetooth => Some(registry::BLUETOOTH_OOB),
            Self::WifiWps => Some(registry::WIFI_WSC),
            Self::WifiP2p => Some(registry::WIFI_P2P),
            Self::Unknown => None,
        }
    }
}
