use std::sync::Arc;

use flume::Sender;
use handover_carrier::CarrierType;
use tracing::{debug, error, info, warn};

use super::{Connection, LlcpTransport, collect_carriers, describe};
use crate::{
    HandoverError, Result,
    config::HandoverConfig,
    message::{HandoverMessage, HandoverRole},
    negotiation::{ConnectionData, Negotiators},
};

/// Result of pairing with one requester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOutcome {
    pub handle: u32,
    pub carrier_type: CarrierType,
    pub result: Result<ConnectionData>,
}

#[derive(Debug)]
enum ServerStep {
    ReceiveRequest,
    BuildSelect(HandoverMessage),
    Pair {
        request: HandoverMessage,
        select: HandoverMessage,
    },
    SendSelect(HandoverMessage),
    Closed,
}

/// Selecting side of a handover
#[derive(Debug, Clone)]
pub struct HandoverServer {
    transport: Arc<dyn LlcpTransport>,
    negotiators: Negotiators,
    config: Arc<HandoverConfig>,
    outcomes: Sender<ServerOutcome>,
}

impl HandoverServer {
    pub fn new(
        transport: Arc<dyn LlcpTransport>,
        negotiators: Negotiators,
        config: Arc<HandoverConfig>,
        outcomes: Sender<ServerOutcome>,
    ) -> Self {
        Self {
            transport,
            negotiators,
            config,
            outcomes,
        }
    }

    /// Listen on the handover service of `handle` and serve connections one by one
    pub async fn serve(&self, handle: u32) -> Result<()> {
        let server = self
            .transport
            .simple_server(handle, &self.config.service_name, self.config.sap)
            .await?;

        info!(
            "handover server listening on {} sap {:#04x}",
            self.config.service_name, self.config.sap
        );

        loop {
            let socket = self.transport.simple_accept(handle, server).await?;
            debug!("accepted handover connection on socket {socket}");

            let mut connection = Connection::new(self.transport.clone(), handle, socket);
            if let Err(error) = self.serve_connection(&mut connection).await {
                error!("handover exchange on socket {socket} failed: {error}");
            }

            connection.close().await;
        }
    }

    /// Answer requests on `connection` until the peer closes it
    pub async fn serve_connection(&self, connection: &mut Connection) -> Result<()> {
        let mut step = ServerStep::ReceiveRequest;

        loop {
            step = match step {
                ServerStep::ReceiveRequest => match connection.receive_message().await? {
                    Some(message) => ServerStep::BuildSelect(HandoverMessage::import(&message)?),
                    None => ServerStep::Closed,
                },

                ServerStep::BuildSelect(request) => {
                    let select = self.build_select(&request).await?;
                    ServerStep::Pair { request, select }
                }

                ServerStep::Pair { request, select } => {
                    self.pair(connection.handle(), &request).await;
                    ServerStep::SendSelect(select)
                }

                ServerStep::SendSelect(select) => {
                    connection.send(&select.to_bytes()?).await?;
                    ServerStep::ReceiveRequest
                }

                ServerStep::Closed => return Ok(()),
            };
        }
    }

    /// Validate `request` and describe the local carriers it has in common with us
    pub async fn build_select(&self, request: &HandoverMessage) -> Result<HandoverMessage> {
        request.validate_request(self.config.version)?;

        let mut select = HandoverMessage::select(self.config.version);
        select.carriers = collect_carriers(
            &self.negotiators,
            &self.config.carrier_priority,
            HandoverRole::Selector,
            |carrier_type| request.has_carrier(carrier_type),
        )
        .await;

        debug!(
            "built handover select with {} carriers",
            select.carriers.len()
        );

        Ok(select)
    }

    /// Pair with the requester's preferred carrier, failures are reported but do not end the exchange
    async fn pair(&self, handle: u32, request: &HandoverMessage) {
        let usable = self.negotiators.usable(&self.config.carrier_priority);
        let Some(carrier) = request.select_carrier(&usable) else {
            warn!("request offers no carrier we can pair with");
            return;
        };

        let result = match self.negotiators.get(carrier.carrier_type) {
            Some(negotiator) => negotiator.do_pairing(carrier).await,
            None => Err(HandoverError::NotSupported(format!(
                "no {} negotiator",
                carrier.carrier_type
            ))),
        };

        match &result {
            Ok(data) => info!("paired with {} over {}", describe(data), carrier.carrier_type),
            Err(error) => warn!("pairing over {} failed: {error}", carrier.carrier_type),
        }

        let outcome = ServerOutcome {
            handle,
            carrier_type: carrier.carrier_type,
            result,
        };

        if self.outcomes.send(outcome).is_err() {
            debug!("no listener for server outcomes");
        }
    }
}
