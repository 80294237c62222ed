use std::fmt::Debug;

use async_trait::async_trait;
use handover_carrier::P2pDevice;

use super::RadioEvents;
use crate::RadioError;

pub type P2pAddress = [u8; 6];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum P2pEvent {
    StateChanged { activated: bool },
    PeerFound { address: P2pAddress, name: Option<String> },
    DiscoveryFinished,
    Connected { address: P2pAddress },
    ConnectionFailed { address: P2pAddress, reason: String },
}

#[async_trait]
pub trait P2pAdapter: Debug + Send + Sync + 'static {
    fn events(&self) -> &RadioEvents<P2pEvent>;

    async fn is_activated(&self) -> Result<bool, RadioError>;
    async fn activate(&self) -> Result<(), RadioError>;
    async fn deactivate(&self) -> Result<(), RadioError>;

    async fn local_device(&self) -> Result<P2pDevice, RadioError>;
    async fn is_connected(&self, address: P2pAddress) -> Result<bool, RadioError>;

    /// Peers are reported as [`P2pEvent::PeerFound`] until [`P2pEvent::DiscoveryFinished`]
    async fn start_discovery(&self) -> Result<(), RadioError>;
    async fn stop_discovery(&self) -> Result<(), RadioError>;

    async fn connect(&self, address: P2pAddress) -> Result<(), RadioError>;
}
