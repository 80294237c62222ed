use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use handover_ndef::{NdefMessage, NdefReader, ReadResult};
use tracing::{debug, trace, warn};

use crate::{Result, TransportError};

/// Socket id handed out by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub struct Socket(pub u32);

/// Reliable point-to-point transport between the two NFC devices
///
/// `handle` identifies the tapped peer. Framing and retransmission are the
/// transport's job, a receive may still return any part of a message.
#[async_trait]
pub trait LlcpTransport: Debug + Send + Sync + 'static {
    /// Listen for handover clients under `service_name` / `sap`
    async fn simple_server(
        &self,
        handle: u32,
        service_name: &str,
        sap: u8,
    ) -> Result<Socket, TransportError>;

    async fn simple_accept(&self, handle: u32, server: Socket) -> Result<Socket, TransportError>;

    async fn simple_client(&self, handle: u32, service_name: &str)
    -> Result<Socket, TransportError>;

    async fn simple_send(&self, handle: u32, socket: Socket, data: &[u8])
    -> Result<(), TransportError>;

    /// Next chunk of data, empty once the peer closed the connection
    async fn simple_receive(&self, handle: u32, socket: Socket) -> Result<Vec<u8>, TransportError>;

    async fn close(&self, handle: u32, socket: Socket) -> Result<(), TransportError>;
}

/// A connected socket that exchanges whole NDEF messages
#[derive(Debug)]
pub struct Connection {
    transport: Arc<dyn LlcpTransport>,
    handle: u32,
    socket: Socket,
    reader: NdefReader,
}

impl Connection {
    pub fn new(transport: Arc<dyn LlcpTransport>, handle: u32, socket: Socket) -> Self {
        Self {
            transport,
            handle,
            socket,
            reader: NdefReader::new(),
        }
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub async fn send(&self, bytes: &[u8]) -> Result<()> {
        debug!("sending {} bytes on socket {}", bytes.len(), self.socket);
        trace!("outgoing bytes: {}", hex::encode(bytes));
        self.transport
            .simple_send(self.handle, self.socket, bytes)
            .await?;

        Ok(())
    }

    /// Receive one complete message, `None` if the peer closed between messages
    ///
    /// A truncated message keeps the connection receiving, any other decode
    /// failure ends the exchange.
    pub async fn receive_message(&mut self) -> Result<Option<NdefMessage>> {
        // bytes left over from the previous read may already hold a message
        if self.reader.buffered() > 0 && !self.reader.is_started() {
            if let ReadResult::Complete(message) = self.reader.push(&[])? {
                return Ok(Some(message));
            }
        }

        loop {
            let chunk = self
                .transport
                .simple_receive(self.handle, self.socket)
                .await?;

            if chunk.is_empty() {
                if self.reader.buffered() == 0 {
                    debug!("socket {} closed by peer", self.socket);
                    return Ok(None);
                }

                return Err(TransportError::Closed.into());
            }

            trace!("incoming bytes: {}", hex::encode(&chunk));
            match self.reader.push(&chunk)? {
                ReadResult::Complete(message) => return Ok(Some(message)),
                ReadResult::Incomplete { needed } => {
                    debug!("received {} bytes, need {needed} more", chunk.len());
                }
            }
        }
    }

    pub async fn close(self) {
        if let Err(error) = self.transport.close(self.handle, self.socket).await {
            warn!("unable to close socket {}: {error}", self.socket);
        }
    }
}
