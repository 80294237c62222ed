use std::fmt::Debug;

use async_trait::async_trait;
use bitflags::bitflags;
use handover_carrier::{BluetoothOob, registry::bt};

use super::RadioEvents;
use crate::RadioError;

pub type BluetoothAddress = [u8; bt::ADDRESS_LEN];

bitflags! {
    /// Profiles a bonded device advertises
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ServiceMask: u32 {
        const SERIAL_PORT = 1 << 0;
        const HEADSET = 1 << 1;
        const HANDSFREE = 1 << 2;
        const A2DP = 1 << 3;
        const AVRCP = 1 << 4;
        const HID = 1 << 5;
        const OBJECT_PUSH = 1 << 6;
        const PAN = 1 << 7;

        const AUDIO = Self::HEADSET.bits() | Self::HANDSFREE.bits() | Self::A2DP.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum BluetoothProfile {
    Audio,
    Hid,
}

impl ServiceMask {
    /// Profile to connect once bonded, audio wins over HID
    pub fn connectable_profile(self) -> Option<BluetoothProfile> {
        if self.intersects(Self::AUDIO) {
            Some(BluetoothProfile::Audio)
        } else if self.contains(Self::HID) {
            Some(BluetoothProfile::Hid)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BluetoothEvent {
    AdapterStateChanged {
        enabled: bool,
    },
    BondCreated {
        address: BluetoothAddress,
        result: Result<(), RadioError>,
    },
    ProfileConnectionChanged {
        address: BluetoothAddress,
        profile: BluetoothProfile,
        connected: bool,
    },
}

/// Calls the bluetooth negotiation makes on the local bluetooth stack
///
/// `enable`, `create_bond` and `connect_profile` only start the operation, the
/// outcome arrives as a [`BluetoothEvent`].
#[async_trait]
pub trait BluetoothAdapter: Debug + Send + Sync + 'static {
    fn events(&self) -> &RadioEvents<BluetoothEvent>;

    async fn is_enabled(&self) -> Result<bool, RadioError>;
    async fn enable(&self) -> Result<(), RadioError>;
    async fn disable(&self) -> Result<(), RadioError>;

    /// Local address, name, class of device and freshly generated SSP hash and randomizer
    async fn local_oob_data(&self) -> Result<BluetoothOob, RadioError>;
    async fn set_remote_oob_data(&self, oob: &BluetoothOob) -> Result<(), RadioError>;

    async fn is_bonded(&self, address: BluetoothAddress) -> Result<bool, RadioError>;
    async fn create_bond(&self, address: BluetoothAddress) -> Result<(), RadioError>;
    async fn service_mask(&self, address: BluetoothAddress) -> Result<ServiceMask, RadioError>;

    async fn is_profile_connected(
        &self,
        address: BluetoothAddress,
        profile: BluetoothProfile,
    ) -> Result<bool, RadioError>;

    async fn connect_profile(
        &self,
        address: BluetoothAddress,
        profile: BluetoothProfile,
    ) -> Result<(), RadioError>;
}
