//! Bluetooth SSP out-of-band record
//!
//! Wire layout: `{total length: u16 LE}{address: 6 bytes}{EIR fields}` where every EIR
//! field is `{length incl. tag: u8}{tag: u8}{value}`. The address and the SSP hash and
//! randomizer are little endian on the wire and kept in display order internally.

use handover_ndef::NdefRecord;
use tracing::warn;

use crate::{
    CarrierError, Result,
    carrier_type::CarrierType,
    codec::CarrierCodec,
    config::CarrierConfig,
    registry::{self, bt},
    wire::{self, truncated},
};

const HEADER_LEN: usize = 2 + bt::ADDRESS_LEN;

#[derive(Debug, Clone, Copy)]
pub struct BluetoothCodec;

impl CarrierCodec for BluetoothCodec {
    const CARRIER_TYPE: CarrierType = CarrierType::Bluetooth;

    fn to_record(config: &CarrierConfig) -> Result<NdefRecord> {
        Self::check_type(config)?;
        let payload = encode_payload(config)?;
        Ok(NdefRecord::mime(registry::BLUETOOTH_OOB, payload))
    }

    fn from_record(record: &NdefRecord) -> Result<CarrierConfig> {
        if !Self::matches(record) {
            return Err(CarrierError::NotSupported(
                "not a bluetooth oob record".to_string(),
            ));
        }

        decode_payload(&record.payload)
    }
}

/// Fields this system reads from and writes into a bluetooth carrier
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BluetoothOob {
    pub address: [u8; bt::ADDRESS_LEN],
    pub hash_c: Option<[u8; bt::OOB_HASH_LEN]>,
    pub randomizer_r: Option<[u8; bt::OOB_HASH_LEN]>,
    pub name: Option<String>,
    pub class_of_device: Option<[u8; bt::COD_LEN]>,
    pub manufacturer: Option<Vec<u8>>,
}

impl BluetoothOob {
    pub fn from_config(config: &CarrierConfig) -> Result<Self> {
        let address = fixed(config.get(bt::ADDRESS)?, "bluetooth address")?;

        let optional_fixed = |attribute| -> Result<Option<_>> {
            match config.get(attribute) {
                Ok(value) => fixed(value, "bluetooth oob data").map(Some),
                Err(_) => Ok(None),
            }
        };

        let hash_c = optional_fixed(bt::OOB_HASH_C)?;
        let randomizer_r = optional_fixed(bt::OOB_HASH_R)?;

        let class_of_device = match config.get(bt::COD) {
            Ok(value) => Some(fixed(value, "class of device")?),
            Err(_) => None,
        };

        let name = config
            .get(bt::NAME)
            .or_else(|_| config.get(bt::NAME_PART))
            .ok()
            .map(|name| String::from_utf8_lossy(name).into_owned());

        let manufacturer = config.get(bt::MANUFACTURER).ok().map(<[u8]>::to_vec);

        Ok(Self {
            address,
            hash_c,
            randomizer_r,
            name,
            class_of_device,
            manufacturer,
        })
    }

    pub fn to_config(&self) -> Result<CarrierConfig> {
        let mut config = CarrierConfig::new(CarrierType::Bluetooth);
        config.add(bt::ADDRESS, self.address)?;

        if let Some(hash_c) = self.hash_c {
            config.add(bt::OOB_HASH_C, hash_c)?;
        }

        if let Some(randomizer_r) = self.randomizer_r {
            config.add(bt::OOB_HASH_R, randomizer_r)?;
        }

        if let Some(name) = &self.name {
            config.add(bt::NAME, name.as_bytes())?;
        }

        if let Some(class_of_device) = self.class_of_device {
            config.add(bt::COD, class_of_device)?;
        }

        if let Some(manufacturer) = &self.manufacturer {
            config.add(bt::MANUFACTURER, manufacturer.as_slice())?;
        }

        Ok(config)
    }

    pub fn has_oob_data(&self) -> bool {
        self.hash_c.is_some() && self.randomizer_r.is_some()
    }

    /// `AA:BB:CC:DD:EE:FF`
    pub fn address_string(&self) -> String {
        format_address(&self.address)
    }
}

pub fn format_address(address: &[u8]) -> String {
    address
        .iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

fn is_little_endian_field(attribute: u16) -> bool {
    matches!(attribute, bt::ADDRESS | bt::OOB_HASH_C | bt::OOB_HASH_R)
}

fn fixed<const N: usize>(value: &[u8], field: &str) -> Result<[u8; N]> {
    value.try_into().map_err(|_| {
        CarrierError::InvalidFormat(format!(
            "{field} must be {N} bytes, found {}",
            value.len()
        ))
    })
}

fn encode_payload(config: &CarrierConfig) -> Result<Vec<u8>> {
    let address = config.get(bt::ADDRESS)?;
    if address.len() != bt::ADDRESS_LEN {
        return Err(CarrierError::InvalidFormat(format!(
            "bluetooth address must be {} bytes, found {}",
            bt::ADDRESS_LEN,
            address.len()
        )));
    }

    let mut eir = Vec::new();
    for property in config.iter() {
        if property.attribute == bt::ADDRESS {
            continue;
        }

        let Some(value) = property.as_leaf() else {
            return Err(CarrierError::InvalidFormat(format!(
                "bluetooth attribute {:#04x} can not be a group",
                property.attribute
            )));
        };

        let tag = u8::try_from(property.attribute).map_err(|_| {
            CarrierError::InvalidFormat(format!(
                "{:#06x} is not an EIR data type",
                property.attribute
            ))
        })?;

        let length = u8::try_from(value.len() + 1).map_err(|_| {
            CarrierError::InvalidFormat(format!("EIR field {tag:#04x} is too long"))
        })?;

        eir.push(length);
        eir.push(tag);

        if is_little_endian_field(property.attribute) {
            eir.extend(wire::reversed(value));
        } else {
            eir.extend_from_slice(value);
        }
    }

    let total = u16::try_from(HEADER_LEN + eir.len())
        .map_err(|_| CarrierError::InvalidFormat("bluetooth oob data is too long".to_string()))?;

    let mut payload = Vec::with_capacity(total as usize);
    payload.extend_from_slice(&total.to_le_bytes());
    payload.extend(wire::reversed(address));
    payload.extend(eir);

    Ok(payload)
}

fn decode_payload(payload: &[u8]) -> Result<CarrierConfig> {
    let mut input = payload;
    let total = wire::u16_le(&mut input).map_err(truncated("oob data length"))? as usize;

    if total < HEADER_LEN || total > payload.len() {
        return Err(CarrierError::InvalidFormat(format!(
            "oob data length {total} does not fit a payload of {} bytes",
            payload.len()
        )));
    }

    let address = wire::bytes(&mut input, bt::ADDRESS_LEN).map_err(truncated("bluetooth address"))?;

    let mut config = CarrierConfig::new(CarrierType::Bluetooth);
    config.add(bt::ADDRESS, wire::reversed(address))?;

    let mut eir = &payload[HEADER_LEN..total];
    while !eir.is_empty() {
        let length = wire::byte(&mut eir).map_err(truncated("EIR length"))?;

        // a zero length marks the end of the significant part
        if length == 0 {
            break;
        }

        let tag = wire::byte(&mut eir).map_err(truncated("EIR tag"))?;
        let value = wire::bytes(&mut eir, length as usize - 1).map_err(truncated("EIR value"))?;

        let attribute = u16::from(tag);
        let value = if is_little_endian_field(attribute) {
            wire::reversed(value)
        } else {
            value.to_vec()
        };

        if let Err(error) = config.add(attribute, value) {
            warn!("ignoring EIR field: {error}");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ADDRESS: [u8; 6] = [0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13];

    fn sample() -> BluetoothOob {
        BluetoothOob {
            address: ADDRESS,
            hash_c: Some(core::array::from_fn(|i| i as u8)),
            randomizer_r: Some(core::array::from_fn(|i| 0xF0 | i as u8)),
            name: Some("headset".to_string()),
            class_of_device: Some([0x04, 0x04, 0x20]),
            manufacturer: None,
        }
    }

    #[test]
    fn round_trip_keeps_internal_order() {
        let config = sample().to_config().unwrap();
        let record = BluetoothCodec::to_record(&config).unwrap();
        let decoded = BluetoothCodec::from_record(&record).unwrap();

        assert_eq!(decoded.get(bt::ADDRESS).unwrap(), &ADDRESS);
        assert_eq!(
            decoded.get(bt::OOB_HASH_C).unwrap(),
            config.get(bt::OOB_HASH_C).unwrap()
        );
        assert_eq!(
            decoded.get(bt::OOB_HASH_R).unwrap(),
            config.get(bt::OOB_HASH_R).unwrap()
        );
        assert_eq!(BluetoothOob::from_config(&decoded).unwrap(), sample());
    }

    #[test]
    fn wire_layout() {
        let mut config = CarrierConfig::new(CarrierType::Bluetooth);
        config.add(bt::ADDRESS, ADDRESS).unwrap();
        config.add(bt::NAME, b"ab".to_vec()).unwrap();

        let record = BluetoothCodec::to_record(&config).unwrap();
        assert_eq!(record.type_, registry::BLUETOOTH_OOB.as_bytes());
        assert_eq!(
            record.payload,
            vec![
                12, 0x00, // total length, little endian
                0x13, 0x71, 0xDA, 0x7D, 0x1A, 0x00, // reversed address
                0x03, 0x09, b'a', b'b', // name
            ]
        );
    }

    #[test]
    fn zero_length_field_ends_eir() {
        let payload = vec![
            14, 0x00, 0x13, 0x71, 0xDA, 0x7D, 0x1A, 0x00, 0x02, 0x0A, 0x04, 0x00, 0xAA, 0xBB,
        ];

        let record = NdefRecord::mime(registry::BLUETOOTH_OOB, payload);
        let config = BluetoothCodec::from_record(&record).unwrap();

        assert_eq!(config.get(bt::TX_POWER).unwrap(), &[0x04]);
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn malformed_payloads() {
        let short = NdefRecord::mime(registry::BLUETOOTH_OOB, vec![0x08, 0x00, 0x01]);
        assert!(matches!(
            BluetoothCodec::from_record(&short),
            Err(CarrierError::InvalidFormat(_))
        ));

        // EIR length runs past the declared total
        let overrun = NdefRecord::mime(
            registry::BLUETOOTH_OOB,
            vec![10, 0x00, 1, 2, 3, 4, 5, 6, 0x05, 0x09],
        );
        assert!(matches!(
            BluetoothCodec::from_record(&overrun),
            Err(CarrierError::InvalidFormat(_))
        ));

        let missing_address = CarrierConfig::new(CarrierType::Bluetooth);
        assert_eq!(
            BluetoothCodec::to_record(&missing_address),
            Err(CarrierError::NoDataFound(bt::ADDRESS))
        );
    }

    #[test]
    fn address_display() {
        assert_eq!(sample().address_string(), "00:1A:7D:DA:71:13");
    }
}
