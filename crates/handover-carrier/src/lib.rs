//! Carrier configurations and their carrier records
//!
//! A [`CarrierConfig`] is a tree of attributes describing one alternative carrier.
//! The codecs translate it to and from the media-type records that travel inside
//! a handover message.

pub mod bt;
pub mod carrier_type;
pub mod codec;
pub mod config;
pub mod error;
pub mod property;
pub mod registry;
pub mod wifi;

mod wire;

pub use bt::{BluetoothCodec, BluetoothOob};
pub use carrier_type::CarrierType;
pub use codec::{CarrierCodec, config_from_record, config_to_record};
pub use config::CarrierConfig;
pub use error::{CarrierError, Error, Result};
pub use property::{Property, PropertyGroup, PropertyValue};
pub use wifi::{P2pCodec, P2pDevice, WifiCredential, WpsCodec};
