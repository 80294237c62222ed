use handover_ndef::NdefRecord;

use crate::{
    CarrierError, Result,
    bt::BluetoothCodec,
    carrier_type::CarrierType,
    config::CarrierConfig,
    wifi::{P2pCodec, WpsCodec},
};

/// Mapping between a [`CarrierConfig`] and the payload of a carrier record
pub trait CarrierCodec {
    const CARRIER_TYPE: CarrierType;

    fn matches(record: &NdefRecord) -> bool {
        CarrierType::from_record(record) == Self::CARRIER_TYPE
    }

    fn to_record(config: &CarrierConfig) -> Result<NdefRecord>;

    fn from_record(record: &NdefRecord) -> Result<CarrierConfig>;

    fn check_type(config: &CarrierConfig) -> Result<()> {
        if config.carrier_type == Self::CARRIER_TYPE {
            return Ok(());
        }

        Err(CarrierError::InvalidFormat(format!(
            "{} config given to the {} codec",
            config.carrier_type,
            Self::CARRIER_TYPE
        )))
    }
}

/// Decode any supported carrier record
pub fn config_from_record(record: &NdefRecord) -> Result<CarrierConfig> {
    match CarrierType::from_record(record) {
        CarrierType::Bluetooth => BluetoothCodec::from_record(record),
        CarrierType::WifiWps => WpsCodec::from_record(record),
        CarrierType::WifiP2p => P2pCodec::from_record(record),
        CarrierType::Unknown => Err(CarrierError::NotSupported(format!(
            "carrier record of type {:?}",
            String::from_utf8_lossy(&record.type_)
        ))),
    }
}

/// Encode a carrier config into its record
pub fn config_to_record(config: &CarrierConfig) -> Result<NdefRecord> {
    match config.carrier_type {
        CarrierType::Bluetooth => BluetoothCodec::to_record(config),
        CarrierType::WifiWps => WpsCodec::to_record(config),
        CarrierType::WifiP2p => P2pCodec::to_record(config),
        CarrierType::Unknown => Err(CarrierError::NotSupported(
            "unknown carrier type".to_string(),
        )),
    }
}
