use handover_carrier::{CarrierConfig, CarrierType, config_from_record, config_to_record};
use handover_ndef::NdefRecord;

use crate::Result;

/// Carrier power state as carried in an alternative carrier record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::FromRepr,
)]
#[repr(u8)]
pub enum CarrierPowerState {
    Inactivate = 0,
    Activate = 1,
    Activating = 2,
    #[default]
    Unknown = 3,
}

impl CarrierPowerState {
    pub const MASK: u8 = 0x07;

    pub fn from_bits(bits: u8) -> Self {
        Self::from_repr(bits & Self::MASK).unwrap_or(Self::Unknown)
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Activate | Self::Activating)
    }
}

/// One alternative carrier of a handover message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverCarrier {
    pub cps: CarrierPowerState,
    pub carrier_record: NdefRecord,
    pub aux_records: Vec<NdefRecord>,
    pub carrier_type: CarrierType,
}

impl HandoverCarrier {
    /// The carrier type is classified from the record
    pub fn new(cps: CarrierPowerState, carrier_record: NdefRecord) -> Self {
        let carrier_type = CarrierType::from_record(&carrier_record);

        Self {
            cps,
            carrier_record,
            aux_records: Vec::new(),
            carrier_type,
        }
    }

    pub fn from_config(cps: CarrierPowerState, config: &CarrierConfig) -> Result<Self> {
        let record = config_to_record(config)?;
        Ok(Self::new(cps, record))
    }

    pub fn with_aux_records(mut self, aux_records: Vec<NdefRecord>) -> Self {
        self.aux_records = aux_records;
        self
    }

    pub fn push_aux_record(&mut self, record: NdefRecord) {
        self.aux_records.push(record);
    }

    /// Decode the carrier record into its configuration tree
    pub fn config(&self) -> Result<CarrierConfig> {
        Ok(config_from_record(&self.carrier_record)?)
    }
}
