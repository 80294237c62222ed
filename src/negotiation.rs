//! Per carrier negotiations with the local radios
//!
//! Each negotiator answers two questions: describe the local endpoint as a
//! [`HandoverCarrier`], and act on a carrier received from the peer. Both run
//! as explicit step machines that suspend only while waiting on radio events.

pub mod bluetooth;
pub mod p2p;
pub mod slot;
pub mod wps;

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use handover_carrier::CarrierType;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::{
    HandoverError, Result,
    carrier::HandoverCarrier,
    config::HandoverConfig,
    message::HandoverRole,
    notify::Notifier,
    radio::{bluetooth::BluetoothAddress, p2p::P2pAddress},
};

pub use bluetooth::BluetoothNegotiator;
pub use p2p::P2pNegotiator;
pub use slot::{RadioSlot, SlotGuard};
pub use wps::WpsNegotiator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum PairingMode {
    /// Turn the radio on and hand the peer's data to the stack, without connecting
    Prepare,

    #[default]
    Pair,
}

/// What a processed carrier resulted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionData {
    Bluetooth {
        address: BluetoothAddress,
        name: Option<String>,
    },
    Wifi {
        ssid: Vec<u8>,
    },
    P2p {
        address: P2pAddress,
        name: Option<String>,
    },
}

impl ConnectionData {
    pub fn carrier_type(&self) -> CarrierType {
        match self {
            Self::Bluetooth { .. } => CarrierType::Bluetooth,
            Self::Wifi { .. } => CarrierType::WifiWps,
            Self::P2p { .. } => CarrierType::WifiP2p,
        }
    }
}

#[async_trait]
pub trait CarrierNegotiator: Debug + Send + Sync + 'static {
    fn carrier_type(&self) -> CarrierType;

    /// Describe the local endpoint of this carrier
    async fn get_carrier(&self, role: HandoverRole) -> Result<HandoverCarrier>;

    /// Act on a carrier the peer sent
    async fn process_carrier(
        &self,
        carrier: &HandoverCarrier,
        mode: PairingMode,
    ) -> Result<ConnectionData>;

    async fn do_pairing(&self, carrier: &HandoverCarrier) -> Result<ConnectionData> {
        self.process_carrier(carrier, PairingMode::Pair).await
    }
}

/// Run `get_carrier` in the background, `callback` is invoked exactly once
///
/// The task is detached, dropping the returned handle does not cancel it. Only
/// an explicit [`JoinHandle::abort`] stops the callback from firing.
pub fn spawn_get_carrier<F>(
    negotiator: Arc<dyn CarrierNegotiator>,
    role: HandoverRole,
    callback: F,
) -> JoinHandle<()>
where
    F: FnOnce(Result<HandoverCarrier>) + Send + 'static,
{
    tokio::spawn(async move {
        let result = negotiator.get_carrier(role).await;
        callback(result);
    })
}

/// Run `process_carrier` in the background on an owned copy of the carrier, detached like
/// [`spawn_get_carrier`]
pub fn spawn_process_carrier<F>(
    negotiator: Arc<dyn CarrierNegotiator>,
    carrier: HandoverCarrier,
    mode: PairingMode,
    callback: F,
) -> JoinHandle<()>
where
    F: FnOnce(Result<ConnectionData>) + Send + 'static,
{
    tokio::spawn(async move {
        let result = negotiator.process_carrier(&carrier, mode).await;
        callback(result);
    })
}

/// The negotiators available on this device, at most one per carrier type
#[derive(Debug, Clone, Default)]
pub struct Negotiators {
    negotiators: Vec<Arc<dyn CarrierNegotiator>>,
}

impl Negotiators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `negotiator`, replacing any earlier one for the same carrier type
    pub fn with(mut self, negotiator: Arc<dyn CarrierNegotiator>) -> Self {
        let carrier_type = negotiator.carrier_type();
        self.negotiators
            .retain(|existing| existing.carrier_type() != carrier_type);

        self.negotiators.push(negotiator);
        self
    }

    pub fn get(&self, carrier_type: CarrierType) -> Option<&Arc<dyn CarrierNegotiator>> {
        self.negotiators
            .iter()
            .find(|negotiator| negotiator.carrier_type() == carrier_type)
    }

    /// Negotiators in `priority` order, carrier types without one are skipped
    pub fn in_priority<'a>(
        &'a self,
        priority: &'a [CarrierType],
    ) -> impl Iterator<Item = &'a Arc<dyn CarrierNegotiator>> + 'a {
        priority
            .iter()
            .filter_map(|carrier_type| self.get(*carrier_type))
    }

    /// The part of `priority` this device has a negotiator for
    pub fn usable(&self, priority: &[CarrierType]) -> Vec<CarrierType> {
        self.in_priority(priority)
            .map(|negotiator| negotiator.carrier_type())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.negotiators.is_empty()
    }
}

/// Shared by the negotiators: what to do once a run has failed
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    pub config: Arc<HandoverConfig>,
    pub notifier: Arc<dyn Notifier>,
}

impl FailurePolicy {
    pub fn new(config: Arc<HandoverConfig>, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    pub(crate) fn should_restore(&self, turned_on: bool) -> bool {
        turned_on && self.config.restore_radio_power
    }

    /// Log the failure and raise the notification for a failed pairing
    pub(crate) fn pairing_failed(
        &self,
        carrier_type: CarrierType,
        device_name: &str,
        error: &HandoverError,
    ) {
        error!("{carrier_type} pairing with {device_name} failed: {error}");

        if self.config.notify_on_failure {
            self.notifier.pairing_failed(carrier_type, device_name);
        }
    }
}

/// Log a failure to switch a radio back off, the original error is what gets reported
pub(crate) fn log_restore_failure(carrier_type: CarrierType, result: Result<(), crate::RadioError>) {
    if let Err(error) = result {
        warn!("unable to restore {carrier_type} radio power: {error}");
    }
}
