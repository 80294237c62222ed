use std::sync::Arc;

use async_trait::async_trait;
use handover_carrier::{CarrierType, P2pDevice, bt::format_address};
use tracing::{debug, info, warn};

use super::{
    CarrierNegotiator, ConnectionData, FailurePolicy, PairingMode, log_restore_failure,
    slot::RadioSlot,
};
use crate::{
    HandoverError, Result,
    carrier::{CarrierPowerState, HandoverCarrier},
    message::HandoverRole,
    radio::{P2pAdapter, P2pEvent, Subscription, p2p::P2pAddress},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectStep {
    EnsureActive,
    CheckConnected,
    Discover,
    Connect,
    Done,
}

/// Wi-Fi Direct, finds the peer by its device address and connects to it
#[derive(Debug)]
pub struct P2pNegotiator {
    adapter: Arc<dyn P2pAdapter>,
    policy: FailurePolicy,
    slot: RadioSlot,
}

impl P2pNegotiator {
    pub fn new(adapter: Arc<dyn P2pAdapter>, policy: FailurePolicy) -> Self {
        Self {
            adapter,
            policy,
            slot: RadioSlot::new(CarrierType::WifiP2p),
        }
    }
}

struct Run<'a> {
    negotiator: &'a P2pNegotiator,
    subscription: Subscription<P2pEvent>,
    turned_on: bool,
}

impl<'a> Run<'a> {
    fn new(negotiator: &'a P2pNegotiator) -> Self {
        Self {
            negotiator,
            subscription: negotiator.adapter.events().register(),
            turned_on: false,
        }
    }

    fn adapter(&self) -> &dyn P2pAdapter {
        self.negotiator.adapter.as_ref()
    }

    async fn wait_for<T: Send>(
        &self,
        expected: &str,
        matcher: impl FnMut(&P2pEvent) -> Option<T> + Send,
    ) -> Result<T> {
        let timeout = self.negotiator.policy.config.radio_event_timeout();
        self.subscription.wait_for(expected, timeout, matcher).await
    }

    async fn ensure_active(&mut self) -> Result<()> {
        if self.adapter().is_activated().await? {
            return Ok(());
        }

        info!("wifi direct is off, activating it");
        self.adapter().activate().await?;
        self.turned_on = true;

        self.wait_for("wifi direct activated", |event| match event {
            P2pEvent::StateChanged { activated: true } => Some(()),
            _ => None,
        })
        .await
    }

    async fn connect(&mut self, peer: P2pAddress, mode: PairingMode) -> Result<()> {
        let mut step = ConnectStep::EnsureActive;

        loop {
            debug!("wifi direct connect step {step:?}");

            step = match step {
                ConnectStep::EnsureActive => {
                    self.ensure_active().await?;
                    ConnectStep::CheckConnected
                }

                ConnectStep::CheckConnected => {
                    if self.adapter().is_connected(peer).await? {
                        info!("already connected to {}", format_address(&peer));
                        ConnectStep::Done
                    } else {
                        ConnectStep::Discover
                    }
                }

                ConnectStep::Discover => {
                    self.discover(peer).await?;

                    match mode {
                        PairingMode::Prepare => ConnectStep::Done,
                        PairingMode::Pair => ConnectStep::Connect,
                    }
                }

                ConnectStep::Connect => {
                    self.adapter().connect(peer).await?;
                    self.wait_connected(peer).await?;
                    ConnectStep::Done
                }

                ConnectStep::Done => break,
            };
        }

        Ok(())
    }

    /// Scan until the peer shows up, a finished scan without it is a failure
    async fn discover(&self, peer: P2pAddress) -> Result<()> {
        self.adapter().start_discovery().await?;

        let found = self
            .wait_for("peer discovery", |event| match event {
                P2pEvent::PeerFound { address, .. } if *address == peer => Some(true),
                P2pEvent::DiscoveryFinished => Some(false),
                _ => None,
            })
            .await;

        if let Err(error) = self.adapter().stop_discovery().await {
            warn!("unable to stop wifi direct discovery: {error}");
        }

        if !found? {
            return Err(HandoverError::OperationFail(format!(
                "peer {} was not found",
                format_address(&peer)
            )));
        }

        Ok(())
    }

    async fn wait_connected(&self, peer: P2pAddress) -> Result<()> {
        self.wait_for("wifi direct connection", |event| match event {
            P2pEvent::Connected { address } if *address == peer => Some(Ok(())),
            P2pEvent::ConnectionFailed { address, reason } if *address == peer => Some(Err(
                HandoverError::OperationFail(format!("wifi direct connection failed: {reason}")),
            )),
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
            info!("restoring wifi direct power");
            log_restore_failure(CarrierType::WifiP2p, negotiator.adapter.deactivate().await);
        }
    }
}

#[async_trait]
impl CarrierNegotiator for P2pNegotiator {
    fn carrier_type(&self) -> CarrierType {
        CarrierType::WifiP2p
    }

    async fn get_carrier(&self, role: HandoverRole) -> Result<HandoverCarrier> {
        let _guard = self.slot.try_acquire()?;
        debug!("building wifi direct carrier as {role}");

        let mut run = Run::new(self);
        let result = match run.ensure_active().await {
            Ok(()) => run.adapter().local_device().await.map_err(HandoverError::from),
            Err(error) => Err(error),
        };
        run.finish(result.is_err()).await;

        let config = result?.to_config()?;
        HandoverCarrier::from_config(CarrierPowerState::Activate, &config)
    }

    async fn process_carrier(
        &self,
        carrier: &HandoverCarrier,
        mode: PairingMode,
    ) -> Result<ConnectionData> {
        let _guard = self.slot.try_acquire()?;

        let device = P2pDevice::from_config(&carrier.config()?)?;
        let device_name = device
            .device_name
            .clone()
            .unwrap_or_else(|| format_address(&device.device_address));

        let mut run = Run::new(self);
        let result = run.connect(device.device_address, mode).await;
        run.finish(result.is_err()).await;

        if let Err(error) = &result {
            self.policy
                .pairing_failed(CarrierType::WifiP2p, &device_name, error);
        }

        result.map(|()| ConnectionData::P2p {
            address: device.device_address,
            name: device.device_name,
        })
    }
}
