//! Client and server roles of the handover exchange
//!
//! The client sends a request and pairs with the carrier picked from the
//! select it gets back. The server answers every request on a connection with a
//! select and pairs with the requester's preferred carrier.

pub mod client;
pub mod server;
pub mod service;
pub mod transport;

use handover_carrier::CarrierType;
use tracing::{debug, warn};

use crate::{
    carrier::HandoverCarrier,
    message::HandoverRole,
    negotiation::{ConnectionData, Negotiators},
};

pub use client::{ClientOutcome, HandoverClient};
pub use server::{HandoverServer, ServerOutcome};
pub use service::HandoverService;
pub use transport::{Connection, LlcpTransport, Socket};

/// Ask every negotiator `wanted` accepts for its local carrier, in priority order
///
/// Carriers that fail are left out of the message.
pub(crate) async fn collect_carriers(
    negotiators: &Negotiators,
    priority: &[CarrierType],
    role: HandoverRole,
    wanted: impl Fn(CarrierType) -> bool,
) -> Vec<HandoverCarrier> {
    let mut carriers = Vec::new();

    for negotiator in negotiators.in_priority(priority) {
        let carrier_type = negotiator.carrier_type();
        if !wanted(carrier_type) {
            continue;
        }

        match negotiator.get_carrier(role).await {
            Ok(carrier) => {
                debug!("adding local {carrier_type} carrier");
                carriers.push(carrier);
            }
            Err(error) => warn!("no local {carrier_type} carrier: {error}"),
        }
    }

    carriers
}

pub(crate) fn describe(data: &ConnectionData) -> String {
    match data {
        ConnectionData::Bluetooth { address, .. } | ConnectionData::P2p { address, .. } => {
            handover_carrier::bt::format_address(address)
        }
        ConnectionData::Wifi { ssid } => String::from_utf8_lossy(ssid).into_owned(),
    }
}
