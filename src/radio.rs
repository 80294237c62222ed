//! Radio stacks the negotiations drive
//!
//! Adapters are implemented outside this crate. Asynchronous completions
//! (adapter switched on, bond created, peer connected) are published on the
//! adapter's [`RadioEvents`], which negotiations subscribe to for the length of
//! one run.

pub mod bluetooth;
pub mod p2p;
pub mod wifi;

use std::{fmt::Debug, sync::Arc, time::Duration};

use flume::{Receiver, Sender};
use handover_tokio::FutureTimeoutExt as _;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{HandoverError, RadioError, Result};

pub use bluetooth::{BluetoothAdapter, BluetoothEvent, BluetoothProfile, ServiceMask};
pub use p2p::{P2pAdapter, P2pEvent};
pub use wifi::{NetworkId, WifiAdapter, WifiEvent};

#[derive(Debug)]
struct Subscribers<E> {
    next_id: u64,
    senders: Vec<(u64, Sender<E>)>,
}

/// Fan out of one radio's events to every registered subscription
#[derive(Debug)]
pub struct RadioEvents<E> {
    inner: Arc<Mutex<Subscribers<E>>>,
}

impl<E> Clone for RadioEvents<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E> Default for RadioEvents<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Subscribers {
                next_id: 0,
                senders: Vec::new(),
            })),
        }
    }
}

impl<E> RadioEvents<E>
where
    E: Debug + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> Subscription<E> {
        let (sender, receiver) = flume::unbounded();

        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.senders.push((id, sender));

        debug!("radio event subscription {id} registered");
        Subscription {
            id,
            receiver,
            events: self.clone(),
            registered: true,
        }
    }

    /// Publish `event` to every current subscription
    pub fn emit(&self, event: E) {
        let mut inner = self.inner.lock();
        trace!("radio event {event:?} to {} subscribers", inner.senders.len());

        inner
            .senders
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().senders.len()
    }

    fn unregister(&self, id: u64) {
        self.inner.lock().senders.retain(|(sub_id, _)| *sub_id != id);
        debug!("radio event subscription {id} unregistered");
    }
}

/// One registration on a [`RadioEvents`], released once on [`Self::unregister`] or drop
#[derive(Debug)]
pub struct Subscription<E>
where
    E: Debug + Clone + Send + 'static,
{
    id: u64,
    receiver: Receiver<E>,
    events: RadioEvents<E>,
    registered: bool,
}

impl<E> Subscription<E>
where
    E: Debug + Clone + Send + 'static,
{
    pub async fn next(&self) -> Result<E> {
        let event = self
            .receiver
            .recv_async()
            .await
            .map_err(|_| RadioError::EventsClosed)?;

        Ok(event)
    }

    /// Wait for the first event `matcher` accepts, other events are logged and dropped
    pub async fn wait_for<T, F>(&self, expected: &str, timeout: Option<Duration>, mut matcher: F) -> Result<T>
    where
        T: Send,
        F: FnMut(&E) -> Option<T> + Send,
    {
        let wait = async {
            loop {
                let event = self.next().await?;
                match matcher(&event) {
                    Some(value) => return Ok::<T, HandoverError>(value),
                    None => debug!("discarding {event:?} while waiting for {expected}"),
                }
            }
        };

        wait.with_optional_timeout(timeout).await?
    }

    pub fn unregister(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.registered) {
            self.events.unregister(self.id);
        }
    }
}

impl<E> Drop for Subscription<E>
where
    E: Debug + Clone + Send + 'static,
{
    fn drop(&mut self) {
        self.release();
    }
}
