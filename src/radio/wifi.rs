use std::fmt::Debug;

use async_trait::async_trait;
use handover_carrier::WifiCredential;

use super::RadioEvents;
use crate::RadioError;

/// Handle of a saved network profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub struct NetworkId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiEvent {
    StateChanged { enabled: bool },
    Connected { ssid: Vec<u8> },
    ConnectionFailed { ssid: Vec<u8>, reason: String },
}

#[async_trait]
pub trait WifiAdapter: Debug + Send + Sync + 'static {
    fn events(&self) -> &RadioEvents<WifiEvent>;

    async fn is_enabled(&self) -> Result<bool, RadioError>;
    async fn enable(&self) -> Result<(), RadioError>;
    async fn disable(&self) -> Result<(), RadioError>;

    async fn connected_ssid(&self) -> Result<Option<Vec<u8>>, RadioError>;

    /// Saved network with this ssid, if any
    async fn find_network(&self, ssid: &[u8]) -> Result<Option<NetworkId>, RadioError>;
    async fn add_network(&self, ssid: &[u8]) -> Result<NetworkId, RadioError>;

    /// Apply authentication, encryption and passphrase to a saved network
    async fn configure_network(
        &self,
        network: NetworkId,
        credential: &WifiCredential,
    ) -> Result<(), RadioError>;

    /// Start connecting, completion is a [`WifiEvent::Connected`] or [`WifiEvent::ConnectionFailed`]
    async fn connect(&self, network: NetworkId) -> Result<(), RadioError>;
}
