use std::sync::Arc;

use async_trait::async_trait;
use handover_carrier::{CarrierType, WifiCredential, registry};
use handover_ndef::NdefRecord;
use tracing::{debug, info};

use super::{
    CarrierNegotiator, ConnectionData, FailurePolicy, PairingMode, log_restore_failure,
    slot::RadioSlot,
};
use crate::{
    HandoverError, Result,
    carrier::{CarrierPowerState, HandoverCarrier},
    message::HandoverRole,
    radio::{NetworkId, Subscription, WifiAdapter, WifiEvent},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectStep {
    EnsureRadio,
    CheckConnected,
    FindNetwork,
    AddNetwork,
    Configure(NetworkId),
    Connect(NetworkId),
    Done,
}

/// Wi-Fi Protected Setup, joins the access point described by a credential
#[derive(Debug)]
pub struct WpsNegotiator {
    adapter: Arc<dyn WifiAdapter>,
    policy: FailurePolicy,
    slot: RadioSlot,
}

impl WpsNegotiator {
    pub fn new(adapter: Arc<dyn WifiAdapter>, policy: FailurePolicy) -> Self {
        Self {
            adapter,
            policy,
            slot: RadioSlot::new(CarrierType::WifiWps),
        }
    }
}

struct Run<'a> {
    negotiator: &'a WpsNegotiator,
    subscription: Subscription<WifiEvent>,
    turned_on: bool,
}

impl<'a> Run<'a> {
    fn new(negotiator: &'a WpsNegotiator) -> Self {
        Self {
            negotiator,
            subscription: negotiator.adapter.events().register(),
            turned_on: false,
        }
    }

    fn adapter(&self) -> &dyn WifiAdapter {
        self.negotiator.adapter.as_ref()
    }

    async fn ensure_radio_on(&mut self) -> Result<()> {
        if self.adapter().is_enabled().await? {
            return Ok(());
        }

        info!("wifi is off, enabling it");
        self.adapter().enable().await?;
        self.turned_on = true;

        let timeout = self.negotiator.policy.config.radio_event_timeout();
        self.subscription
            .wait_for("wifi enabled", timeout, |event| match event {
                WifiEvent::StateChanged { enabled: true } => Some(()),
                _ => None,
            })
            .await
    }

    async fn connect(&mut self, credential: &WifiCredential, mode: PairingMode) -> Result<()> {
        let ssid = credential.ssid.as_slice();
        let mut step = ConnectStep::EnsureRadio;

        loop {
            debug!("wifi connect step {step:?}");

            step = match step {
                ConnectStep::EnsureRadio => {
                    self.ensure_radio_on().await?;
                    ConnectStep::CheckConnected
                }

                ConnectStep::CheckConnected => {
                    let connected = self.adapter().connected_ssid().await?;
                    if connected.as_deref() == Some(ssid) {
                        info!("already connected to {}", credential.ssid_string());
                        ConnectStep::Done
                    } else {
                        ConnectStep::FindNetwork
                    }
                }

                ConnectStep::FindNetwork => match self.adapter().find_network(ssid).await? {
                    Some(network) => ConnectStep::Configure(network),
                    None => ConnectStep::AddNetwork,
                },

                ConnectStep::AddNetwork => {
                    let network = self.adapter().add_network(ssid).await?;
                    ConnectStep::Configure(network)
                }

                ConnectStep::Configure(network) => {
                    self.adapter().configure_network(network, credential).await?;

                    match mode {
                        PairingMode::Prepare => ConnectStep::Done,
                        PairingMode::Pair => ConnectStep::Connect(network),
                    }
                }

                ConnectStep::Connect(network) => {
                    self.adapter().connect(network).await?;
                    self.wait_connected(ssid).await?;
                    ConnectStep::Done
                }

                ConnectStep::Done => break,
            };
        }

        Ok(())
    }

    async fn wait_connected(&self, ssid: &[u8]) -> Result<()> {
        let timeout = self.negotiator.policy.config.radio_event_timeout();

        self.subscription
            .wait_for("wifi connection", timeout, |event| match event {
                WifiEvent::Connected { ssid: connected } if connected == ssid => Some(Ok(())),
                WifiEvent::ConnectionFailed { ssid: failed, reason } if failed == ssid => Some(
                    Err(HandoverError::OperationFail(format!("wifi connection failed: {reason}"))),
                ),
                _ => None,
            })
            .await?
    }

    async fn finish(self, failed: bool) {
        let Self {
            negotiator,
            subscription,
            turned_on,
        } = self;

        subscription.unregister();

        if failed && negotiator.policy.should_restore(turned_on) {
            info!("restoring wifi power");
            log_restore_failure(CarrierType::WifiWps, negotiator.adapter.disable().await);
        }
    }
}

#[async_trait]
impl CarrierNegotiator for WpsNegotiator {
    fn carrier_type(&self) -> CarrierType {
        CarrierType::WifiWps
    }

    /// A requester only announces that it can take a credential
    async fn get_carrier(&self, role: HandoverRole) -> Result<HandoverCarrier> {
        if role == HandoverRole::Selector {
            return Err(HandoverError::NotSupported(
                "building a wps selector carrier".to_string(),
            ));
        }

        let _guard = self.slot.try_acquire()?;

        let mut run = Run::new(self);
        let result = run.ensure_radio_on().await;
        run.finish(result.is_err()).await;
        result?;

        let record = NdefRecord::mime(registry::WIFI_WSC, Vec::new());
        Ok(HandoverCarrier::new(CarrierPowerState::Activate, record))
    }

    async fn process_carrier(
        &self,
        carrier: &HandoverCarrier,
        mode: PairingMode,
    ) -> Result<ConnectionData> {
        let _guard = self.slot.try_acquire()?;

        let credential = WifiCredential::from_config(&carrier.config()?)?;

        let mut run = Run::new(self);
        let result = run.connect(&credential, mode).await;
        run.finish(result.is_err()).await;

        if let Err(error) = &result {
            self.policy
                .pairing_failed(CarrierType::WifiWps, &credential.ssid_string(), error);
        }

        result.map(|()| ConnectionData::Wifi {
            ssid: credential.ssid,
        })
    }
}
