use std::sync::Arc;

use async_trait::async_trait;
use handover_carrier::{BluetoothOob, CarrierType, bt::format_address};
use tracing::{debug, info};

use super::{
    CarrierNegotiator, ConnectionData, FailurePolicy, PairingMode, log_restore_failure,
    slot::RadioSlot,
};
use crate::{
    HandoverError, Result,
    carrier::{CarrierPowerState, HandoverCarrier},
    message::HandoverRole,
    radio::{
        BluetoothAdapter, BluetoothEvent, BluetoothProfile, Subscription,
        bluetooth::BluetoothAddress,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GetStep {
    EnsureRadio,
    ReadLocalData,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairStep {
    EnsureRadio,
    CheckBonded,
    InjectOob,
    CreateBond,
    FindProfile,
    ConnectProfile(BluetoothProfile),
    Done,
}

/// Bluetooth SSP out-of-band pairing
#[derive(Debug)]
pub struct BluetoothNegotiator {
    adapter: Arc<dyn BluetoothAdapter>,
    policy: FailurePolicy,
    slot: RadioSlot,
}

impl BluetoothNegotiator {
    pub fn new(adapter: Arc<dyn BluetoothAdapter>, policy: FailurePolicy) -> Self {
        Self {
            adapter,
            policy,
            slot: RadioSlot::new(CarrierType::Bluetooth),
        }
    }
}

/// State of one negotiation run, the subscription is released exactly once when
/// the run is finished
struct Run<'a> {
    negotiator: &'a BluetoothNegotiator,
    subscription: Subscription<BluetoothEvent>,
    turned_on: bool,
}

impl<'a> Run<'a> {
    fn new(negotiator: &'a BluetoothNegotiator) -> Self {
        Self {
            negotiator,
            subscription: negotiator.adapter.events().register(),
            turned_on: false,
        }
    }

    fn adapter(&self) -> &dyn BluetoothAdapter {
        self.negotiator.adapter.as_ref()
    }

    async fn wait_for<T: Send>(
        &self,
        expected: &str,
        matcher: impl FnMut(&BluetoothEvent) -> Option<T> + Send,
    ) -> Result<T> {
        let timeout = self.negotiator.policy.config.radio_event_timeout();
        self.subscription.wait_for(expected, timeout, matcher).await
    }

    async fn ensure_radio_on(&mut self) -> Result<()> {
        if self.adapter().is_enabled().await? {
            return Ok(());
        }

        info!("bluetooth is off, enabling it");
        self.adapter().enable().await?;
        self.turned_on = true;

        self.wait_for("bluetooth enabled", |event| match event {
            BluetoothEvent::AdapterStateChanged { enabled: true } => Some(()),
            _ => None,
        })
        .await
    }

    async fn get_carrier(&mut self) -> Result<HandoverCarrier> {
        let mut step = GetStep::EnsureRadio;
        let mut carrier = None;

        loop {
            debug!("bluetooth get carrier step {step:?}");

            step = match step {
                GetStep::EnsureRadio => {
                    self.ensure_radio_on().await?;
                    GetStep::ReadLocalData
                }

                GetStep::ReadLocalData => {
                    let oob = self.adapter().local_oob_data().await?;
                    let config = oob.to_config()?;
                    carrier = Some(HandoverCarrier::from_config(
                        CarrierPowerState::Activate,
                        &config,
                    )?);

                    GetStep::Done
                }

                GetStep::Done => break,
            };
        }

        carrier.ok_or_else(|| {
            HandoverError::OperationFail("bluetooth carrier was not built".to_string())
        })
    }

    async fn pair(&mut self, oob: &BluetoothOob, mode: PairingMode) -> Result<()> {
        let address = oob.address;
        let mut step = PairStep::EnsureRadio;

        loop {
            debug!("bluetooth pairing step {step:?}");

            step = match step {
                PairStep::EnsureRadio => {
                    self.ensure_radio_on().await?;
                    PairStep::CheckBonded
                }

                PairStep::CheckBonded => {
                    if self.adapter().is_bonded(address).await? {
                        info!("{} is already bonded", format_address(&address));
                        PairStep::Done
                    } else {
                        PairStep::InjectOob
                    }
                }

                PairStep::InjectOob => {
                    self.adapter().set_remote_oob_data(oob).await?;

                    match mode {
                        PairingMode::Prepare => PairStep::Done,
                        PairingMode::Pair => PairStep::CreateBond,
                    }
                }

                PairStep::CreateBond => {
                    self.adapter().create_bond(address).await?;
                    self.wait_bond(address).await?;
                    PairStep::FindProfile
                }

                PairStep::FindProfile => {
                    let services = self.adapter().service_mask(address).await?;
                    match services.connectable_profile() {
                        Some(profile) => PairStep::ConnectProfile(profile),
                        None => PairStep::Done,
                    }
                }

                PairStep::ConnectProfile(profile) => {
                    if !self.adapter().is_profile_connected(address, profile).await? {
                        self.adapter().connect_profile(address, profile).await?;
                        self.wait_profile(address, profile).await?;
                    }

                    PairStep::Done
                }

                PairStep::Done => break,
            };
        }

        Ok(())
    }

    async fn wait_bond(&self, address: BluetoothAddress) -> Result<()> {
        let result = self
            .wait_for("bond created", |event| match event {
                BluetoothEvent::BondCreated {
                    address: bonded,
                    result,
                } if *bonded == address => Some(result.clone()),
                _ => None,
            })
            .await?;

        Ok(result?)
    }

    async fn wait_profile(&self, address: BluetoothAddress, profile: BluetoothProfile) -> Result<()> {
        let connected = self
            .wait_for("profile connection", |event| match event {
                BluetoothEvent::ProfileConnectionChanged {
                    address: peer,
                    profile: changed,
                    connected,
                } if *peer == address && *changed == profile => Some(*connected),
                _ => None,
            })
            .await?;

        if !connected {
            return Err(HandoverError::OperationFail(format!(
                "{profile} profile did not connect"
            )));
        }

        Ok(())
    }

    /// Release the subscription and switch the radio back off if the run failed
    async fn finish(self, failed: bool) {
        let Self {
            negotiator,
            subscription,
            turned_on,
        } = self;

        subscription.unregister();

        if failed && negotiator.policy.should_restore(turned_on) {
            info!("restoring bluetooth power");
            log_restore_failure(CarrierType::Bluetooth, negotiator.adapter.disable().await);
        }
    }
}

#[async_trait]
impl CarrierNegotiator for BluetoothNegotiator {
    fn carrier_type(&self) -> CarrierType {
        CarrierType::Bluetooth
    }

    async fn get_carrier(&self, role: HandoverRole) -> Result<HandoverCarrier> {
        let _guard = self.slot.try_acquire()?;
        debug!("building bluetooth carrier as {role}");

        let mut run = Run::new(self);
        let result = run.get_carrier().await;
        run.finish(result.is_err()).await;

        result
    }

    async fn process_carrier(
        &self,
        carrier: &HandoverCarrier,
        mode: PairingMode,
    ) -> Result<ConnectionData> {
        let _guard = self.slot.try_acquire()?;

        let oob = BluetoothOob::from_config(&carrier.config()?)?;
        let device_name = oob.name.clone().unwrap_or_else(|| oob.address_string());

        let mut run = Run::new(self);
        let result = run.pair(&oob, mode).await;
        run.finish(result.is_err()).await;

        if let Err(error) = &result {
            self.policy
                .pairing_failed(CarrierType::Bluetooth, &device_name, error);
        }

        result.map(|()| ConnectionData::Bluetooth {
            address: oob.address,
            name: oob.name,
        })
    }
}
