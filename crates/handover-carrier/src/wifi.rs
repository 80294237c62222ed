//! Wi-Fi Simple Configuration and Wi-Fi Direct records
//!
//! Attributes are `{type: u16 BE}{length: u16 BE}{value}`, a credential nests a
//! further attribute list in its value. A Wi-Fi Direct payload is two length
//! prefixed blocks, WSC attributes first and P2P attributes second.

use std::borrow::Cow;

use handover_ndef::NdefRecord;
use tracing::warn;

use crate::{
    CarrierError, Result,
    carrier_type::CarrierType,
    codec::CarrierCodec,
    config::CarrierConfig,
    property::{Property, PropertyGroup, PropertyValue},
    registry::{self, MAX_NESTING_DEPTH, p2p, wifi},
    wire::{self, truncated},
};

/// Display, push button and keypad
const P2P_CONFIG_METHODS: [u8; 2] = [0x01, 0x88];

/// Telephone, smartphone dual mode, WFA OUI
const P2P_PRIMARY_DEVICE_TYPE: [u8; 8] = [0x00, 0x0A, 0x00, 0x50, 0xF2, 0x04, 0x00, 0x05];

const BROADCAST_MAC: [u8; wifi::MAC_ADDR_LEN] = [0xFF; wifi::MAC_ADDR_LEN];

#[derive(Debug, Clone, Copy)]
pub struct WpsCodec;

impl CarrierCodec for WpsCodec {
    const CARRIER_TYPE: CarrierType = CarrierType::WifiWps;

    fn to_record(config: &CarrierConfig) -> Result<NdefRecord> {
        Self::check_type(config)?;

        let mut payload = Vec::new();
        encode_attributes(config.properties().iter(), &mut payload, 1)?;

        Ok(NdefRecord::mime(registry::WIFI_WSC, payload))
    }

    fn from_record(record: &NdefRecord) -> Result<CarrierConfig> {
        if !Self::matches(record) {
            return Err(CarrierError::NotSupported("not a wsc record".to_string()));
        }

        let properties = decode_attributes(&record.payload, 1)?;
        Ok(CarrierConfig::with_properties(CarrierType::WifiWps, properties))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct P2pCodec;

impl CarrierCodec for P2pCodec {
    const CARRIER_TYPE: CarrierType = CarrierType::WifiP2p;

    fn to_record(config: &CarrierConfig) -> Result<NdefRecord> {
        Self::check_type(config)?;

        let (wsc, p2p): (Vec<&Property>, Vec<&Property>) = config
            .iter()
            .partition(|property| property.attribute >= wifi::WSC_ATTRIBUTE_MIN);

        let mut payload = Vec::new();
        write_block(&mut payload, wsc)?;
        write_block(&mut payload, p2p)?;

        Ok(NdefRecord::mime(registry::WIFI_P2P, payload))
    }

    fn from_record(record: &NdefRecord) -> Result<CarrierConfig> {
        if !Self::matches(record) {
            return Err(CarrierError::NotSupported("not a p2p record".to_string()));
        }

        let mut input = record.payload.as_slice();
        let wsc = read_block(&mut input, "wsc block")?;
        let p2p = read_block(&mut input, "p2p block")?;

        let mut properties = decode_attributes(wsc, 1)?;
        for property in decode_attributes(p2p, 1)?.iter().cloned() {
            if let Err(error) = properties.push(property) {
                warn!("ignoring p2p attribute: {error}");
            }
        }

        Ok(CarrierConfig::with_properties(CarrierType::WifiP2p, properties))
    }
}

fn write_block(payload: &mut Vec<u8>, properties: Vec<&Property>) -> Result<()> {
    let mut block = Vec::new();
    encode_attributes(properties.into_iter(), &mut block, 1)?;

    let length = u16::try_from(block.len())
        .map_err(|_| CarrierError::InvalidFormat("attribute block is too long".to_string()))?;

    payload.extend_from_slice(&length.to_be_bytes());
    payload.extend(block);
    Ok(())
}

fn read_block<'i>(input: &mut &'i [u8], field: &'static str) -> Result<&'i [u8]> {
    let length = wire::u16_be(input).map_err(truncated(field))?;
    wire::bytes(input, length as usize).map_err(truncated(field))
}

fn encode_attributes<'a>(
    properties: impl Iterator<Item = &'a Property>,
    out: &mut Vec<u8>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(CarrierError::TooDeep(MAX_NESTING_DEPTH));
    }

    for property in properties {
        let value = match &property.value {
            PropertyValue::Leaf(bytes) => Cow::Borrowed(bytes.as_slice()),
            PropertyValue::Group(group) => {
                let mut nested = Vec::new();
                encode_attributes(group.iter(), &mut nested, depth + 1)?;
                Cow::Owned(nested)
            }
        };

        let length = u16::try_from(value.len()).map_err(|_| {
            CarrierError::InvalidFormat(format!(
                "attribute {:#06x} is too long",
                property.attribute
            ))
        })?;

        out.extend_from_slice(&property.attribute.to_be_bytes());
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&value);
    }

    Ok(())
}

fn decode_attributes(mut input: &[u8], depth: usize) -> Result<PropertyGroup> {
    if depth > MAX_NESTING_DEPTH {
        return Err(CarrierError::TooDeep(MAX_NESTING_DEPTH));
    }

    let mut group = PropertyGroup::new();
    while !input.is_empty() {
        let attribute = wire::u16_be(&mut input).map_err(truncated("attribute type"))?;
        let length = wire::u16_be(&mut input).map_err(truncated("attribute length"))?;
        let value = wire::bytes(&mut input, length as usize).map_err(truncated("attribute value"))?;

        let property = if attribute == wifi::CREDENTIAL {
            Property::group(attribute, decode_attributes(value, depth + 1)?)
        } else {
            Property::leaf(attribute, value)
        };

        if let Err(error) = group.push(property) {
            warn!("ignoring wifi attribute: {error}");
        }
    }

    Ok(group)
}

/// Network parameters carried by a WPS credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredential {
    pub ssid: Vec<u8>,
    pub auth_type: u16,
    pub enc_type: u16,
    pub network_key: Vec<u8>,
    pub mac_address: Option<[u8; wifi::MAC_ADDR_LEN]>,
}

impl WifiCredential {
    /// Read the credential group, or the top level if the token has none
    pub fn from_config(config: &CarrierConfig) -> Result<Self> {
        let credential = config.group(wifi::CREDENTIAL).unwrap_or(config.properties());

        let ssid = credential
            .get(wifi::SSID)
            .map_err(|_| CarrierError::InvalidFormat("credential has no ssid".to_string()))?
            .to_vec();

        let auth_type = read_u16(credential, wifi::AUTH_TYPE)?.unwrap_or(wifi::auth::OPEN);
        let enc_type = read_u16(credential, wifi::ENC_TYPE)?.unwrap_or(wifi::enc::NONE);

        let network_key = credential
            .get(wifi::NET_KEY)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        let mac_address = credential
            .get(wifi::MAC_ADDR)
            .ok()
            .and_then(|mac| <[u8; wifi::MAC_ADDR_LEN]>::try_from(mac).ok())
            .filter(|mac| *mac != BROADCAST_MAC);

        Ok(Self {
            ssid,
            auth_type,
            enc_type,
            network_key,
            mac_address,
        })
    }

    pub fn to_config(&self) -> Result<CarrierConfig> {
        let mut credential = PropertyGroup::new();
        credential.add(wifi::NET_INDEX, [0x01u8])?;
        credential.add(wifi::SSID, self.ssid.as_slice())?;
        credential.add(wifi::AUTH_TYPE, self.auth_type.to_be_bytes())?;
        credential.add(wifi::ENC_TYPE, self.enc_type.to_be_bytes())?;
        credential.add(wifi::NET_KEY, self.network_key.as_slice())?;
        credential.add(wifi::MAC_ADDR, self.mac_address.unwrap_or(BROADCAST_MAC))?;

        let mut config = CarrierConfig::new(CarrierType::WifiWps);
        config.add(wifi::VERSION, [wifi::VERSION_1_0])?;
        config.add_group(wifi::CREDENTIAL, credential)?;

        Ok(config)
    }

    pub fn ssid_string(&self) -> String {
        String::from_utf8_lossy(&self.ssid).into_owned()
    }
}

fn read_u16(group: &PropertyGroup, attribute: u16) -> Result<Option<u16>> {
    let Ok(value) = group.get(attribute) else {
        return Ok(None);
    };

    let bytes: [u8; 2] = value.try_into().map_err(|_| {
        CarrierError::InvalidFormat(format!("attribute {attribute:#06x} must be 2 bytes"))
    })?;

    Ok(Some(u16::from_be_bytes(bytes)))
}

/// The peer a Wi-Fi Direct carrier describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P2pDevice {
    pub device_address: [u8; wifi::MAC_ADDR_LEN],
    pub device_name: Option<String>,
}

impl P2pDevice {
    /// The device address comes from the P2P device info, the P2P device id or the
    /// WSC mac address, in that order
    pub fn from_config(config: &CarrierConfig) -> Result<Self> {
        let device_address = [p2p::DEVICE_INFO, p2p::DEVICE_ID, wifi::MAC_ADDR]
            .into_iter()
            .filter_map(|attribute| config.get(attribute).ok())
            .find_map(|value| value.get(..wifi::MAC_ADDR_LEN))
            .and_then(|mac| mac.try_into().ok())
            .ok_or_else(|| {
                CarrierError::InvalidFormat("p2p carrier has no device address".to_string())
            })?;

        let device_name = config
            .get(wifi::DEVICE_NAME)
            .ok()
            .map(|name| String::from_utf8_lossy(name).into_owned());

        Ok(Self {
            device_address,
            device_name,
        })
    }

    pub fn to_config(&self) -> Result<CarrierConfig> {
        let name = self.device_name.clone().unwrap_or_default();
        let name_len = u16::try_from(name.len()).map_err(|_| {
            CarrierError::InvalidParam(format!("device name of {} bytes is too long", name.len()))
        })?;

        let mut device_info = Vec::new();
        device_info.extend_from_slice(&self.device_address);
        device_info.extend_from_slice(&P2P_CONFIG_METHODS);
        device_info.extend_from_slice(&P2P_PRIMARY_DEVICE_TYPE);
        device_info.push(0x00);
        device_info.extend_from_slice(&wifi::DEVICE_NAME.to_be_bytes());
        device_info.extend_from_slice(&name_len.to_be_bytes());
        device_info.extend_from_slice(name.as_bytes());

        let mut config = CarrierConfig::new(CarrierType::WifiP2p);
        config.add(wifi::VERSION, [wifi::VERSION_1_0])?;
        config.add(wifi::MAC_ADDR, self.device_address)?;

        if let Some(name) = &self.device_name {
            config.add(wifi::DEVICE_NAME, name.as_bytes())?;
        }

        config.add(p2p::CAPABILITY, [0x00u8, 0x00])?;
        config.add(p2p::DEVICE_INFO, device_info)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn credential() -> WifiCredential {
        WifiCredential {
            ssid: b"home-net".to_vec(),
            auth_type: wifi::auth::WPA2_PSK,
            enc_type: wifi::enc::AES,
            network_key: b"passphrase".to_vec(),
            mac_address: None,
        }
    }

    #[test]
    fn wps_round_trip_with_credential_group() {
        let config = credential().to_config().unwrap();
        let record = WpsCodec::to_record(&config).unwrap();
        assert_eq!(record.type_, registry::WIFI_WSC.as_bytes());

        let decoded = WpsCodec::from_record(&record).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(WifiCredential::from_config(&decoded).unwrap(), credential());
    }

    #[test]
    fn wps_wire_layout() {
        let mut config = CarrierConfig::new(CarrierType::WifiWps);
        let mut credential = PropertyGroup::new();
        credential.add(wifi::SSID, b"ab".to_vec()).unwrap();
        config.add_group(wifi::CREDENTIAL, credential).unwrap();

        let record = WpsCodec::to_record(&config).unwrap();
        assert_eq!(
            record.payload,
            vec![0x10, 0x0E, 0x00, 0x06, 0x10, 0x45, 0x00, 0x02, b'a', b'b']
        );
    }

    #[test]
    fn truncated_attribute() {
        let record = NdefRecord::mime(registry::WIFI_WSC, vec![0x10, 0x45, 0x00, 0x05, b'a']);
        assert!(matches!(
            WpsCodec::from_record(&record),
            Err(CarrierError::InvalidFormat(_))
        ));
    }

    #[test]
    fn nested_credentials_are_capped() {
        // every level is a credential holding the next one
        let mut payload: Vec<u8> = Vec::new();
        for _ in 0..=MAX_NESTING_DEPTH {
            let mut outer = Vec::new();
            outer.extend_from_slice(&wifi::CREDENTIAL.to_be_bytes());
            outer.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            outer.extend(payload);
            payload = outer;
        }

        let record = NdefRecord::mime(registry::WIFI_WSC, payload);
        assert_eq!(
            WpsCodec::from_record(&record),
            Err(CarrierError::TooDeep(MAX_NESTING_DEPTH))
        );
    }

    #[test]
    fn p2p_round_trip_splits_blocks() {
        let device = P2pDevice {
            device_address: [0x02, 0x11, 0x22, 0x33, 0x44, 0x55],
            device_name: Some("phone".to_string()),
        };

        let config = device.to_config().unwrap();
        let record = P2pCodec::to_record(&config).unwrap();

        // first block holds only wsc attributes
        let wsc_len = u16::from_be_bytes([record.payload[0], record.payload[1]]) as usize;
        assert_eq!(&record.payload[2..4], &wifi::VERSION.to_be_bytes());

        let p2p_start = 2 + wsc_len;
        let p2p_len =
            u16::from_be_bytes([record.payload[p2p_start], record.payload[p2p_start + 1]]) as usize;
        assert_eq!(record.payload.len(), p2p_start + 2 + p2p_len);
        assert_eq!(
            &record.payload[p2p_start + 2..p2p_start + 4],
            &p2p::CAPABILITY.to_be_bytes()
        );

        let decoded = P2pCodec::from_record(&record).unwrap();
        assert_eq!(P2pDevice::from_config(&decoded).unwrap(), device);
    }

    #[test]
    fn p2p_name_must_fit_the_length_field() {
        let mut device = P2pDevice {
            device_address: [0x02, 0x11, 0x22, 0x33, 0x44, 0x55],
            device_name: Some("n".repeat(usize::from(u16::MAX) + 1)),
        };

        assert!(matches!(
            device.to_config(),
            Err(CarrierError::InvalidParam(_))
        ));

        device.device_name = Some("n".repeat(usize::from(u16::MAX)));
        assert!(device.to_config().is_ok());
    }

    #[test]
    fn p2p_address_from_wsc_mac() {
        let mut config = CarrierConfig::new(CarrierType::WifiP2p);
        config.add(wifi::MAC_ADDR, [9u8, 8, 7, 6, 5, 4]).unwrap();

        let device = P2pDevice::from_config(&config).unwrap();
        assert_eq!(device.device_address, [9, 8, 7, 6, 5, 4]);

        let empty = CarrierConfig::new(CarrierType::WifiP2p);
        assert!(P2pDevice::from_config(&empty).is_err());
    }
}
