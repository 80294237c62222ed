use std::sync::Arc;

use handover_carrier::CarrierType;
use tracing::{debug, info};

use super::{Connection, LlcpTransport, collect_carriers, describe};
use crate::{
    HandoverError, Result,
    config::HandoverConfig,
    message::{HandoverMessage, HandoverRole, collision_resolution},
    negotiation::{ConnectionData, Negotiators},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOutcome {
    pub carrier_type: CarrierType,
    pub data: ConnectionData,
}

#[derive(Debug)]
enum ClientStep {
    BuildRequest,
    SendRequest(HandoverMessage),
    ReceiveSelect,
    ProcessSelect(HandoverMessage),
    Done(ClientOutcome),
}

/// Requesting side of a handover
#[derive(Debug, Clone)]
pub struct HandoverClient {
    transport: Arc<dyn LlcpTransport>,
    negotiators: Negotiators,
    config: Arc<HandoverConfig>,
}

impl HandoverClient {
    pub fn new(
        transport: Arc<dyn LlcpTransport>,
        negotiators: Negotiators,
        config: Arc<HandoverConfig>,
    ) -> Self {
        Self {
            transport,
            negotiators,
            config,
        }
    }

    /// Connect to the handover service of the peer behind `handle` and run one exchange
    pub async fn run(&self, handle: u32) -> Result<ClientOutcome> {
        let socket = self
            .transport
            .simple_client(handle, &self.config.service_name)
            .await?;

        let mut connection = Connection::new(self.transport.clone(), handle, socket);
        let result = self.exchange(&mut connection).await;
        connection.close().await;

        result
    }

    async fn exchange(&self, connection: &mut Connection) -> Result<ClientOutcome> {
        let mut step = ClientStep::BuildRequest;

        loop {
            step = match step {
                ClientStep::BuildRequest => ClientStep::SendRequest(self.build_request().await?),

                ClientStep::SendRequest(request) => {
                    connection.send(&request.to_bytes()?).await?;
                    ClientStep::ReceiveSelect
                }

                ClientStep::ReceiveSelect => {
                    let message = connection.receive_message().await?.ok_or_else(|| {
                        HandoverError::Transport(crate::TransportError::Closed)
                    })?;

                    ClientStep::ProcessSelect(HandoverMessage::import(&message)?)
                }

                ClientStep::ProcessSelect(select) => {
                    ClientStep::Done(self.process_select(&select).await?)
                }

                ClientStep::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// Request carrying every local carrier that could be described
    pub async fn build_request(&self) -> Result<HandoverMessage> {
        let carriers = collect_carriers(
            &self.negotiators,
            &self.config.carrier_priority,
            HandoverRole::Requester,
            |_| true,
        )
        .await;

        if carriers.is_empty() {
            return Err(HandoverError::NotSupported(
                "no local carrier is available".to_string(),
            ));
        }

        let mut request =
            HandoverMessage::request(self.config.version, collision_resolution::random_number());
        request.carriers = carriers;

        debug!(
            "built handover request with {} carriers",
            request.carriers.len()
        );

        Ok(request)
    }

    /// Pair with the highest priority carrier of the select
    pub async fn process_select(&self, select: &HandoverMessage) -> Result<ClientOutcome> {
        select.validate_select(self.config.version)?;

        let usable = self.negotiators.usable(&self.config.carrier_priority);
        let carrier = select
            .select_carrier(&usable)
            .ok_or_else(|| {
                HandoverError::NotSupported("select offers no usable carrier".to_string())
            })?;

        let negotiator = self.negotiators.get(carrier.carrier_type).ok_or_else(|| {
            HandoverError::NotSupported(format!("no {} negotiator", carrier.carrier_type))
        })?;

        let data = negotiator.do_pairing(carrier).await?;
        info!("handover to {} {} done", carrier.carrier_type, describe(&data));

        Ok(ClientOutcome {
            carrier_type: carrier.carrier_type,
            data,
        })
    }
}
