//! NFC Connection Handover
//!
//! Two devices that touch over NFC exchange handover request and select
//! messages describing Bluetooth, Wi-Fi (WPS) and Wi-Fi Direct carriers, then
//! pair over the carrier both of them prefer.

pub mod carrier;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod negotiation;
pub mod notify;
pub mod radio;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use handover_carrier as carriers;
pub use handover_ndef as ndef;

pub use carrier::{CarrierPowerState, HandoverCarrier};
pub use config::HandoverConfig;
pub use error::{Error, HandoverError, RadioError, Result, TransportError};
pub use message::{HandoverMessage, HandoverRole, HandoverType};
pub use negotiation::{CarrierNegotiator, ConnectionData, Negotiators, PairingMode};
pub use session::{ClientOutcome, HandoverService, ServerOutcome};
