//! Connection Handover messages
//!
//! A handover message is an NDEF message whose first record is a `Hr`, `Hs`,
//! `Hm` or `Hi` well known record. Its payload is a version byte followed by an
//! inner NDEF message of alternative carrier (`ac`) records, and for a request a
//! collision resolution (`cr`) record. Every `ac` record points at a carrier
//! record, and optionally auxiliary records, that follow in the outer message.

pub mod codec;
pub mod collision_resolution;

use handover_carrier::CarrierType;

use crate::{HandoverError, Result, carrier::HandoverCarrier, config::DEFAULT_VERSION};

/// Carrier order used when nothing else is configured
pub const DEFAULT_PRIORITY: [CarrierType; 3] = [
    CarrierType::Bluetooth,
    CarrierType::WifiWps,
    CarrierType::WifiP2p,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum HandoverType {
    Request,
    Select,
    Mediation,
    Initiate,
}

impl HandoverType {
    pub fn record_type(self) -> &'static [u8] {
        match self {
            Self::Request => b"Hr",
            Self::Select => b"Hs",
            Self::Mediation => b"Hm",
            Self::Initiate => b"Hi",
        }
    }

    pub fn from_record_type(type_: &[u8]) -> Option<Self> {
        match type_ {
            b"Hr" => Some(Self::Request),
            b"Hs" => Some(Self::Select),
            b"Hm" => Some(Self::Mediation),
            b"Hi" => Some(Self::Initiate),
            _ => None,
        }
    }
}

/// Which side of the exchange a device is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum HandoverRole {
    Requester,
    Selector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverMessage {
    pub version: u8,
    pub message_type: HandoverType,

    /// Collision resolution number, only carried by a request
    pub cr: Option<u16>,

    pub carriers: Vec<HandoverCarrier>,
}

impl HandoverMessage {
    pub fn new(message_type: HandoverType, version: u8) -> Self {
        Self {
            version,
            message_type,
            cr: None,
            carriers: Vec::new(),
        }
    }

    pub fn request(version: u8, cr: u16) -> Self {
        Self {
            cr: Some(cr),
            ..Self::new(HandoverType::Request, version)
        }
    }

    pub fn select(version: u8) -> Self {
        Self::new(HandoverType::Select, version)
    }

    pub fn push_carrier(&mut self, carrier: HandoverCarrier) {
        self.carriers.push(carrier);
    }

    pub fn has_carrier(&self, carrier_type: CarrierType) -> bool {
        self.carriers
            .iter()
            .any(|carrier| carrier.carrier_type == carrier_type)
    }

    /// Check a received request before answering it
    pub fn validate_request(&self, version: u8) -> Result<()> {
        self.check_header(HandoverType::Request, version)?;

        match self.cr {
            Some(cr) if cr != 0 => {}
            _ => {
                return Err(HandoverError::InvalidFormat(
                    "request has no collision resolution number".to_string(),
                ));
            }
        }

        if self.carriers.is_empty() {
            return Err(HandoverError::InvalidFormat(
                "request carries no alternative carrier".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_select(&self, version: u8) -> Result<()> {
        self.check_header(HandoverType::Select, version)
    }

    fn check_header(&self, expected: HandoverType, version: u8) -> Result<()> {
        if self.message_type != expected {
            return Err(HandoverError::InvalidFormat(format!(
                "expected a handover {expected}, found {}",
                self.message_type
            )));
        }

        if self.version != version {
            return Err(HandoverError::InvalidFormat(format!(
                "unsupported handover version {:#04x}, expected {version:#04x}",
                self.version
            )));
        }

        Ok(())
    }

    /// Whether the selector's radio is on
    ///
    /// A single carrier is implicitly active, otherwise at least one carrier
    /// has to be activated or activating.
    pub fn selector_power_state(&self) -> bool {
        match self.carriers.as_slice() {
            [] => false,
            [_] => true,
            carriers => carriers.iter().any(|carrier| carrier.cps.is_active()),
        }
    }

    /// The carrier ranked highest by `priority`, types not listed are never picked
    pub fn select_carrier(&self, priority: &[CarrierType]) -> Option<&HandoverCarrier> {
        self.carriers
            .iter()
            .filter_map(|carrier| {
                priority
                    .iter()
                    .position(|listed| *listed == carrier.carrier_type)
                    .map(|rank| (rank, carrier))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, carrier)| carrier)
    }
}

impl Default for HandoverMessage {
    fn default() -> Self {
        Self::new(HandoverType::Request, DEFAULT_VERSION)
    }
}
