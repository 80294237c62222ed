//! In-memory radios, notifier and transport for the state machine tests

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use async_trait::async_trait;
use flume::{Receiver, Sender};
use handover_carrier::{BluetoothOob, CarrierType, P2pDevice, WifiCredential, bt::format_address};
use parking_lot::Mutex;

use crate::{
    RadioError, TransportError,
    config::HandoverConfig,
    negotiation::FailurePolicy,
    notify::{LogNotifier, Notifier},
    radio::{
        BluetoothAdapter, BluetoothEvent, BluetoothProfile, NetworkId, P2pAdapter, P2pEvent,
        RadioEvents, ServiceMask, WifiAdapter, WifiEvent, bluetooth::BluetoothAddress,
        p2p::P2pAddress,
    },
    session::{LlcpTransport, Socket},
};

pub fn policy() -> FailurePolicy {
    FailurePolicy::new(Arc::new(HandoverConfig::default()), Arc::new(LogNotifier))
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    failures: Mutex<Vec<(CarrierType, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failures(&self) -> Vec<(CarrierType, String)> {
        self.failures.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn pairing_failed(&self, carrier_type: CarrierType, device_name: &str) {
        self.failures
            .lock()
            .push((carrier_type, device_name.to_string()));
    }
}

// MARK: bluetooth

#[derive(Debug)]
struct BluetoothState {
    address: BluetoothAddress,
    enabled: bool,
    bonded: bool,
    services: ServiceMask,
    bond_error: Option<RadioError>,
    remote_oob: Option<BluetoothOob>,
    calls: Vec<String>,
}

#[derive(Debug)]
pub struct FakeBluetooth {
    events: RadioEvents<BluetoothEvent>,
    state: Mutex<BluetoothState>,
}

impl FakeBluetooth {
    pub const LOCAL_ADDRESS: BluetoothAddress = [0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13];

    pub fn new() -> Arc<Self> {
        Self::with_address(Self::LOCAL_ADDRESS)
    }

    pub fn with_address(address: BluetoothAddress) -> Arc<Self> {
        Arc::new(Self {
            events: RadioEvents::new(),
            state: Mutex::new(BluetoothState {
                address,
                enabled: true,
                bonded: false,
                services: ServiceMask::empty(),
                bond_error: None,
                remote_oob: None,
                calls: Vec::new(),
            }),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    pub fn set_bonded(&self, bonded: bool) {
        self.state.lock().bonded = bonded;
    }

    pub fn set_services(&self, services: ServiceMask) {
        self.state.lock().services = services;
    }

    pub fn fail_bond(&self, error: RadioError) {
        self.state.lock().bond_error = Some(error);
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn local_address(&self) -> BluetoothAddress {
        self.state.lock().address
    }

    pub fn remote_oob(&self) -> Option<BluetoothOob> {
        self.state.lock().remote_oob.clone()
    }

    /// Calls that act on a peer, power switching is left out
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn set_power(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
        self.events
            .emit(BluetoothEvent::AdapterStateChanged { enabled });
    }
}

#[async_trait]
impl BluetoothAdapter for FakeBluetooth {
    fn events(&self) -> &RadioEvents<BluetoothEvent> {
        &self.events
    }

    async fn is_enabled(&self) -> Result<bool, RadioError> {
        Ok(self.state.lock().enabled)
    }

    async fn enable(&self) -> Result<(), RadioError> {
        self.set_power(true);
        Ok(())
    }

    async fn disable(&self) -> Result<(), RadioError> {
        self.set_power(false);
        Ok(())
    }

    async fn local_oob_data(&self) -> Result<BluetoothOob, RadioError> {
        Ok(BluetoothOob {
            address: self.local_address(),
            hash_c: Some([0xC0; 16]),
            randomizer_r: Some([0xE0; 16]),
            name: Some("fake bluetooth".to_string()),
            class_of_device: Some([0x0C, 0x02, 0x5A]),
            manufacturer: None,
        })
    }

    async fn set_remote_oob_data(&self, oob: &BluetoothOob) -> Result<(), RadioError> {
        let mut state = self.state.lock();
        state.calls.push("set_remote_oob_data".to_string());
        state.remote_oob = Some(oob.clone());
        Ok(())
    }

    async fn is_bonded(&self, _address: BluetoothAddress) -> Result<bool, RadioError> {
        Ok(self.state.lock().bonded)
    }

    async fn create_bond(&self, address: BluetoothAddress) -> Result<(), RadioError> {
        let result = {
            let mut state = self.state.lock();
            state.calls.push("create_bond".to_string());

            match state.bond_error.clone() {
                Some(error) => Err(error),
                None => {
                    state.bonded = true;
                    Ok(())
                }
            }
        };

        self.events
            .emit(BluetoothEvent::BondCreated { address, result });
        Ok(())
    }

    async fn service_mask(&self, _address: BluetoothAddress) -> Result<ServiceMask, RadioError> {
        Ok(self.state.lock().services)
    }

    async fn is_profile_connected(
        &self,
        _address: BluetoothAddress,
        _profile: BluetoothProfile,
    ) -> Result<bool, RadioError> {
        Ok(false)
    }

    async fn connect_profile(
        &self,
        address: BluetoothAddress,
        profile: BluetoothProfile,
    ) -> Result<(), RadioError> {
        self.state
            .lock()
            .calls
            .push(format!("connect_profile {profile}"));

        self.events.emit(BluetoothEvent::ProfileConnectionChanged {
            address,
            profile,
            connected: true,
        });
        Ok(())
    }
}

// MARK: wifi

#[derive(Debug)]
struct WifiState {
    enabled: bool,
    connected: Option<Vec<u8>>,
    networks: Vec<(NetworkId, Vec<u8>)>,
    connect_error: Option<String>,
    configured: Option<WifiCredential>,
    calls: Vec<String>,
}

#[derive(Debug)]
pub struct FakeWifi {
    events: RadioEvents<WifiEvent>,
    state: Mutex<WifiState>,
}

impl FakeWifi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: RadioEvents::new(),
            state: Mutex::new(WifiState {
                enabled: true,
                connected: None,
                networks: Vec::new(),
                connect_error: None,
                configured: None,
                calls: Vec::new(),
            }),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    pub fn set_connected(&self, ssid: Option<Vec<u8>>) {
        self.state.lock().connected = ssid;
    }

    pub fn fail_connect(&self, reason: &str) {
        self.state.lock().connect_error = Some(reason.to_string());
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn configured(&self) -> Option<WifiCredential> {
        self.state.lock().configured.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn set_power(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
        self.events.emit(WifiEvent::StateChanged { enabled });
    }
}

#[async_trait]
impl WifiAdapter for FakeWifi {
    fn events(&self) -> &RadioEvents<WifiEvent> {
        &self.events
    }

    async fn is_enabled(&self) -> Result<bool, RadioError> {
        Ok(self.state.lock().enabled)
    }

    async fn enable(&self) -> Result<(), RadioError> {
        self.set_power(true);
        Ok(())
    }

    async fn disable(&self) -> Result<(), RadioError> {
        self.set_power(false);
        Ok(())
    }

    async fn connected_ssid(&self) -> Result<Option<Vec<u8>>, RadioError> {
        Ok(self.state.lock().connected.clone())
    }

    async fn find_network(&self, ssid: &[u8]) -> Result<Option<NetworkId>, RadioError> {
        let state = self.state.lock();
        let network = state
            .networks
            .iter()
            .find(|(_, saved)| saved == ssid)
            .map(|(network, _)| *network);

        Ok(network)
    }

    async fn add_network(&self, ssid: &[u8]) -> Result<NetworkId, RadioError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(format!("add_network {}", String::from_utf8_lossy(ssid)));

        let network = NetworkId(state.networks.len() as u32 + 1);
        state.networks.push((network, ssid.to_vec()));
        Ok(network)
    }

    async fn configure_network(
        &self,
        network: NetworkId,
        credential: &WifiCredential,
    ) -> Result<(), RadioError> {
        let mut state = self.state.lock();
        state.calls.push(format!("configure_network {network}"));
        state.configured = Some(credential.clone());
        Ok(())
    }

    async fn connect(&self, network: NetworkId) -> Result<(), RadioError> {
        let event = {
            let mut state = self.state.lock();
            state.calls.push(format!("connect {network}"));

            let ssid = state
                .networks
                .iter()
                .find(|(saved, _)| *saved == network)
                .map(|(_, ssid)| ssid.clone())
                .ok_or_else(|| RadioError::Failed(format!("unknown network {network}")))?;

            match state.connect_error.clone() {
                Some(reason) => WifiEvent::ConnectionFailed { ssid, reason },
                None => {
                    state.connected = Some(ssid.clone());
                    WifiEvent::Connected { ssid }
                }
            }
        };

        self.events.emit(event);
        Ok(())
    }
}

// MARK: wifi direct

#[derive(Debug)]
struct P2pState {
    activated: bool,
    peers: Vec<P2pAddress>,
    connected: Vec<P2pAddress>,
    calls: Vec<String>,
}

#[derive(Debug)]
pub struct FakeP2p {
    events: RadioEvents<P2pEvent>,
    state: Mutex<P2pState>,
}

impl FakeP2p {
    pub const LOCAL_ADDRESS: P2pAddress = [0x02, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE];

    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: RadioEvents::new(),
            state: Mutex::new(P2pState {
                activated: true,
                peers: Vec::new(),
                connected: Vec::new(),
                calls: Vec::new(),
            }),
        })
    }

    pub fn set_activated(&self, activated: bool) {
        self.state.lock().activated = activated;
    }

    pub fn add_peer(&self, address: P2pAddress) {
        self.state.lock().peers.push(address);
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().activated
    }

    pub fn local_address(&self) -> P2pAddress {
        Self::LOCAL_ADDRESS
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn set_power(&self, activated: bool) {
        self.state.lock().activated = activated;
        self.events.emit(P2pEvent::StateChanged { activated });
    }
}

#[async_trait]
impl P2pAdapter for FakeP2p {
    fn events(&self) -> &RadioEvents<P2pEvent> {
        &self.events
    }

    async fn is_activated(&self) -> Result<bool, RadioError> {
        Ok(self.state.lock().activated)
    }

    async fn activate(&self) -> Result<(), RadioError> {
        self.set_power(true);
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), RadioError> {
        self.set_power(false);
        Ok(())
    }

    async fn local_device(&self) -> Result<P2pDevice, RadioError> {
        Ok(P2pDevice {
            device_address: Self::LOCAL_ADDRESS,
            device_name: Some("fake p2p".to_string()),
        })
    }

    async fn is_connected(&self, address: P2pAddress) -> Result<bool, RadioError> {
        Ok(self.state.lock().connected.contains(&address))
    }

    async fn start_discovery(&self) -> Result<(), RadioError> {
        let peers = {
            let mut state = self.state.lock();
            state.calls.push("start_discovery".to_string());
            state.peers.clone()
        };

        for address in peers {
            self.events.emit(P2pEvent::PeerFound {
                address,
                name: None,
            });
        }

        self.events.emit(P2pEvent::DiscoveryFinished);
        Ok(())
    }

    async fn stop_discovery(&self) -> Result<(), RadioError> {
        self.state
            .lock()
            .calls
            .push("stop_discovery".to_string());
        Ok(())
    }

    async fn connect(&self, address: P2pAddress) -> Result<(), RadioError> {
        let event = {
            let mut state = self.state.lock();
            state
                .calls
                .push(format!("connect {}", format_address(&address)));

            if state.peers.contains(&address) {
                state.connected.push(address);
                P2pEvent::Connected { address }
            } else {
                P2pEvent::ConnectionFailed {
                    address,
                    reason: "peer gone".to_string(),
                }
            }
        };

        self.events.emit(event);
        Ok(())
    }
}

// MARK: transport

#[derive(Debug, Clone)]
struct Pipe {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

/// One end of an in-memory link, connections made by a client arrive at the other end's accept
#[derive(Debug)]
pub struct MemoryTransport {
    to_peer: Sender<Pipe>,
    incoming: Receiver<Pipe>,
    sockets: Mutex<HashMap<Socket, Pipe>>,
    next_socket: AtomicU32,
    chunk_size: usize,
}

impl MemoryTransport {
    /// Two linked ends, every send is split into chunks of at most `chunk_size` bytes
    pub fn pair(chunk_size: usize) -> (Arc<Self>, Arc<Self>) {
        let (a_tx, a_rx) = flume::unbounded();
        let (b_tx, b_rx) = flume::unbounded();

        let end = |to_peer, incoming| {
            Arc::new(Self {
                to_peer,
                incoming,
                sockets: Mutex::new(HashMap::new()),
                next_socket: AtomicU32::new(1),
                chunk_size: chunk_size.max(1),
            })
        };

        (end(b_tx, a_rx), end(a_tx, b_rx))
    }

    fn open(&self, pipe: Pipe) -> Socket {
        let socket = Socket(self.next_socket.fetch_add(1, Ordering::Relaxed));
        self.sockets.lock().insert(socket, pipe);
        socket
    }

    fn pipe(&self, socket: Socket) -> Result<Pipe, TransportError> {
        self.sockets
            .lock()
            .get(&socket)
            .cloned()
            .ok_or_else(|| TransportError::Failed(format!("unknown socket {socket}")))
    }
}

#[async_trait]
impl LlcpTransport for MemoryTransport {
    async fn simple_server(
        &self,
        _handle: u32,
        _service_name: &str,
        _sap: u8,
    ) -> Result<Socket, TransportError> {
        Ok(Socket(0))
    }

    async fn simple_accept(&self, _handle: u32, _server: Socket) -> Result<Socket, TransportError> {
        let pipe = self
            .incoming
            .recv_async()
            .await
            .map_err(|_| TransportError::Closed)?;

        Ok(self.open(pipe))
    }

    async fn simple_client(
        &self,
        _handle: u32,
        _service_name: &str,
    ) -> Result<Socket, TransportError> {
        let (client_tx, server_rx) = flume::unbounded();
        let (server_tx, client_rx) = flume::unbounded();

        self.to_peer
            .send(Pipe {
                tx: server_tx,
                rx: server_rx,
            })
            .map_err(|_| TransportError::Closed)?;

        Ok(self.open(Pipe {
            tx: client_tx,
            rx: client_rx,
        }))
    }

    async fn simple_send(
        &self,
        _handle: u32,
        socket: Socket,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let pipe = self.pipe(socket)?;
        for chunk in data.chunks(self.chunk_size) {
            pipe.tx
                .send(chunk.to_vec())
                .map_err(|_| TransportError::Closed)?;
        }

        Ok(())
    }

    async fn simple_receive(&self, _handle: u32, socket: Socket) -> Result<Vec<u8>, TransportError> {
        let pipe = self.pipe(socket)?;
        Ok(pipe.rx.recv_async().await.unwrap_or_default())
    }

    async fn close(&self, _handle: u32, socket: Socket) -> Result<(), TransportError> {
        self.sockets.lock().remove(&socket);
        Ok(())
    }
}
