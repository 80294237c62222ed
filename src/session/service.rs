use std::{collections::HashMap, sync::Arc};

use flume::{Receiver, Sender};
use handover_tokio::AbortableTask;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{ClientOutcome, HandoverClient, HandoverServer, LlcpTransport, ServerOutcome};
use crate::{HandoverError, Result, config::HandoverConfig, negotiation::Negotiators};

/// Entry points used by the service discovery layer
///
/// One server task runs per registered handle and is aborted when the handle is
/// unregistered or the service is dropped.
#[derive(Debug)]
pub struct HandoverService {
    transport: Arc<dyn LlcpTransport>,
    negotiators: Negotiators,
    config: Arc<HandoverConfig>,
    servers: Mutex<HashMap<u32, AbortableTask<()>>>,
    outcomes_tx: Sender<ServerOutcome>,
    outcomes_rx: Receiver<ServerOutcome>,
}

impl HandoverService {
    pub fn new(
        transport: Arc<dyn LlcpTransport>,
        negotiators: Negotiators,
        config: Arc<HandoverConfig>,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = flume::unbounded();

        Self {
            transport,
            negotiators,
            config,
            servers: Mutex::new(HashMap::new()),
            outcomes_tx,
            outcomes_rx,
        }
    }

    /// Pairing outcomes of every server this service runs
    pub fn outcomes(&self) -> Receiver<ServerOutcome> {
        self.outcomes_rx.clone()
    }

    pub fn is_registered(&self, handle: u32) -> bool {
        self.servers
            .lock()
            .get(&handle)
            .is_some_and(|task| !task.is_finished())
    }

    /// Start serving handover requests from the peer behind `handle`
    pub fn default_server_register(&self, handle: u32) -> Result<()> {
        let mut servers = self.servers.lock();
        servers.retain(|_, task| !task.is_finished());

        if servers.contains_key(&handle) {
            return Err(HandoverError::InvalidParam(format!(
                "handover server already registered for handle {handle}"
            )));
        }

        let server = HandoverServer::new(
            self.transport.clone(),
            self.negotiators.clone(),
            self.config.clone(),
            self.outcomes_tx.clone(),
        );

        let task = AbortableTask::spawn(async move {
            if let Err(error) = server.serve(handle).await {
                error!("handover server for handle {handle} stopped: {error}");
            }
        });

        info!("handover server registered for handle {handle}");
        servers.insert(handle, task);

        Ok(())
    }

    pub fn default_server_unregister(&self, handle: u32) -> Result<()> {
        let task = self.servers.lock().remove(&handle).ok_or_else(|| {
            HandoverError::InvalidParam(format!("no handover server for handle {handle}"))
        })?;

        task.abort();
        info!("handover server unregistered for handle {handle}");

        Ok(())
    }

    /// Run one client exchange in the background, `callback` gets the outcome exactly once
    ///
    /// The exchange is detached, dropping the returned handle does not cancel it.
    pub fn default_client_start<F>(&self, handle: u32, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<ClientOutcome>) + Send + 'static,
    {
        let client = HandoverClient::new(
            self.transport.clone(),
            self.negotiators.clone(),
            self.config.clone(),
        );

        tokio::spawn(async move {
            let result = client.run(handle).await;
            callback(result);
        })
    }
}

#[cfg(test)]
mod tests {
    use handover_carrier::CarrierType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        negotiation::BluetoothNegotiator,
        testing::{FakeBluetooth, MemoryTransport, policy},
    };

    fn service(transport: Arc<MemoryTransport>, adapter: Arc<FakeBluetooth>) -> HandoverService {
        let negotiators =
            Negotiators::new().with(Arc::new(BluetoothNegotiator::new(adapter, policy())));

        HandoverService::new(transport, negotiators, Default::default())
    }

    #[tokio::test]
    async fn register_is_once_per_handle() {
        let (transport, _peer) = MemoryTransport::pair(8);
        let service = service(transport, FakeBluetooth::new());

        service.default_server_register(3).unwrap();
        assert!(service.is_registered(3));
        assert!(matches!(
            service.default_server_register(3),
            Err(HandoverError::InvalidParam(_))
        ));

        service.default_server_unregister(3).unwrap();
        assert!(!service.is_registered(3));
        assert!(matches!(
            service.default_server_unregister(3),
            Err(HandoverError::InvalidParam(_))
        ));
    }

    #[tokio::test]
    async fn client_start_reports_once() {
        let (near, far) = MemoryTransport::pair(16);

        let peer_adapter = FakeBluetooth::with_address([0x00, 0x02, 0x03, 0x04, 0x05, 0x06]);
        let server = service(far, peer_adapter);
        server.default_server_register(1).unwrap();

        let client = service(near, FakeBluetooth::new());
        let (tx, rx) = flume::bounded(1);
        // the handle is dropped right away, the exchange keeps running
        drop(client.default_client_start(1, move |result| {
            let _ = tx.send(result);
        }));

        let outcome = rx.recv_async().await.unwrap().unwrap();
        assert_eq!(outcome.carrier_type, CarrierType::Bluetooth);
        assert!(rx.recv_async().await.is_err());

        let server_outcome = server.outcomes().recv_async().await.unwrap();
        assert_eq!(server_outcome.handle, 1);
        assert!(server_outcome.result.is_ok());
    }
}
