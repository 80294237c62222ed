//! Record types and attribute identifiers used on the wire
//!
//! Bluetooth attributes are EIR data types from the Bluetooth Core Specification
//! Supplement, Wi-Fi attributes are from the Wi-Fi Simple Configuration and
//! Wi-Fi P2P technical specifications.

/// Bluetooth Secure Simple Pairing out-of-band data
pub const BLUETOOTH_OOB: &str = "application/vnd.bluetooth.ep.oob";

/// Wi-Fi Simple Configuration (WPS) credential token
pub const WIFI_WSC: &str = "application/vnd.wfa.wsc";

/// WPS token for an ad-hoc network
pub const WIFI_WSC_IBSS: &str = "application/vnd.wfa.wsc;mode=ibss";

/// Wi-Fi Direct (P2P) out-of-band data
pub const WIFI_P2P: &str = "application/vnd.wfa.p2p";

/// Maximum nesting of attribute groups accepted from the wire
pub const MAX_NESTING_DEPTH: usize = 8;

/// Bluetooth EIR data types
pub mod bt {
    pub const UUID16_PART: u16 = 0x02;
    pub const UUID16: u16 = 0x03;
    pub const UUID32_PART: u16 = 0x04;
    pub const UUID32: u16 = 0x05;
    pub const UUID128_PART: u16 = 0x06;
    pub const UUID128: u16 = 0x07;
    pub const NAME_PART: u16 = 0x08;
    pub const NAME: u16 = 0x09;
    pub const TX_POWER: u16 = 0x0A;

    /// Class of device, 3 bytes
    pub const COD: u16 = 0x0D;

    /// Simple pairing hash C, 16 bytes
    pub const OOB_HASH_C: u16 = 0x0E;

    /// Simple pairing randomizer R, 16 bytes
    pub const OOB_HASH_R: u16 = 0x0F;

    pub const DEVICE_ID: u16 = 0x10;
    pub const MANUFACTURER: u16 = 0xFF;

    /// Device address, carried in the fixed header rather than as an EIR field
    pub const ADDRESS: u16 = 0xF0;

    pub const ADDRESS_LEN: usize = 6;
    pub const OOB_HASH_LEN: usize = 16;
    pub const COD_LEN: usize = 3;
}

/// Wi-Fi Simple Configuration attributes
pub mod wifi {
    pub const AP_CHANNEL: u16 = 0x1001;
    pub const AUTH_TYPE: u16 = 0x1003;
    pub const CONFIG_METHODS: u16 = 0x1008;
    pub const CREDENTIAL: u16 = 0x100E;
    pub const ENC_TYPE: u16 = 0x100F;
    pub const DEVICE_NAME: u16 = 0x1011;
    pub const MAC_ADDR: u16 = 0x1020;
    pub const MANUFACTURER: u16 = 0x1021;
    pub const MODEL_NAME: u16 = 0x1023;
    pub const MODEL_NUMBER: u16 = 0x1024;
    pub const NET_INDEX: u16 = 0x1026;
    pub const NET_KEY: u16 = 0x1027;
    pub const OOB_DEVICE_PASSWORD: u16 = 0x102C;
    pub const RF_BANDS: u16 = 0x103C;
    pub const SERIAL_NUMBER: u16 = 0x1042;
    pub const SSID: u16 = 0x1045;
    pub const UUID_E: u16 = 0x1047;
    pub const VENDOR_EXT: u16 = 0x1049;
    pub const VERSION: u16 = 0x104A;
    pub const PRIMARY_DEVICE_TYPE: u16 = 0x1054;

    /// Attributes at or above this id belong to the WSC block of a P2P record
    pub const WSC_ATTRIBUTE_MIN: u16 = 0x0100;

    /// WSC version 1.0
    pub const VERSION_1_0: u8 = 0x10;

    pub const MAC_ADDR_LEN: usize = 6;

    pub mod auth {
        pub const OPEN: u16 = 0x0001;
        pub const WPA_PSK: u16 = 0x0002;
        pub const SHARED: u16 = 0x0004;
        pub const WPA: u16 = 0x0008;
        pub const WPA2: u16 = 0x0010;
        pub const WPA2_PSK: u16 = 0x0020;
    }

    pub mod enc {
        pub const NONE: u16 = 0x0001;
        pub const WEP: u16 = 0x0002;
        pub const TKIP: u16 = 0x0004;
        pub const AES: u16 = 0x0008;
    }
}

/// Wi-Fi P2P attributes
pub mod p2p {
    pub const STATUS: u16 = 0x00;
    pub const MINOR_REASON: u16 = 0x01;
    pub const CAPABILITY: u16 = 0x02;
    pub const DEVICE_ID: u16 = 0x03;
    pub const GROUP_OWNER_INTENT: u16 = 0x04;
    pub const CONFIG_TIMEOUT: u16 = 0x05;
    pub const LISTEN_CHANNEL: u16 = 0x06;
    pub const GROUP_BSSID: u16 = 0x07;
    pub const EXT_LISTEN_TIMING: u16 = 0x08;
    pub const INTENDED_INTERFACE_ADDR: u16 = 0x09;
    pub const MANAGEABILITY: u16 = 0x0A;
    pub const CHANNEL_LIST: u16 = 0x0B;
    pub const NOTICE_OF_ABSENCE: u16 = 0x0C;

    /// P2P device address (6 bytes) followed by config methods, device type and name
    pub const DEVICE_INFO: u16 = 0x0D;

    pub const GROUP_INFO: u16 = 0x0E;
    pub const GROUP_ID: u16 = 0x0F;
    pub const INTERFACE: u16 = 0x10;
    pub const OPERATING_CHANNEL: u16 = 0x11;
    pub const INVITATION_FLAGS: u16 = 0x12;
    pub const OOB_GO_NEGOTIATION_CHANNEL: u16 = 0x13;
}
