//! Single-subscriber publish/subscribe channel
//!
//! Decouples vital ingestion (request handlers) from alert generation (the
//! alert worker). At most one subscription is live at a time; its bounded
//! buffer provides backpressure to publishers.
//!
//! ## States
//!
//! ```text
//!   no subscriber ──subscribe──▶ one subscriber
//!         ▲                            │
//!         └──────── cancel ────────────┘
//!
//!   close(): permanent, force-closes the active subscription
//! ```
//!
//! Delivery is at-most-once: events published while nobody is subscribed are
//! dropped without error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::models::Event;

/// Capability used by the ingestion service to hand events off
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, event: Event) -> Result<()>;
}

/// The registered subscriber's sending half
struct ActiveSubscriber<T> {
    id: u64,
    tx: mpsc::Sender<T>,
    closed: CancellationToken,
}

struct Inner<T> {
    closed: bool,
    next_id: u64,
    active: Option<ActiveSubscriber<T>>,
}

type Shared<T> = Arc<Mutex<Inner<T>>>;

fn lock<T>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-subscriber pubsub over a bounded buffer
pub struct PubSub<T> {
    inner: Shared<T>,
}

impl<T> Clone for PubSub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for PubSub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PubSub<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                closed: false,
                next_id: 0,
                active: None,
            })),
        }
    }

    /// Register the sole subscriber with a buffer of `capacity` events
    ///
    /// A capacity of zero is raised to one. If a subscription is already
    /// active, or the pubsub is closed, the returned subscription is already
    /// closed and cancelling it does nothing.
    pub fn subscribe(&self, capacity: usize) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let closed = CancellationToken::new();

        let mut inner = lock(&self.inner);
        if inner.closed || inner.active.is_some() {
            debug!("subscription rejected (closed: {})", inner.closed);
            closed.cancel();
            return Subscription {
                rx,
                closed,
                slot: None,
            };
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.active = Some(ActiveSubscriber {
            id,
            tx,
            closed: closed.clone(),
        });
        trace!("subscriber {id} registered");

        Subscription {
            rx,
            closed,
            slot: Some((id, Arc::downgrade(&self.inner))),
        }
    }

    /// Publish an event to the active subscriber
    ///
    /// Returns immediately when nobody is subscribed. Otherwise waits for
    /// buffer space, giving up silently if the subscription is cancelled in
    /// the meantime.
    pub async fn publish(&self, event: T) -> Result<()> {
        let (tx, closed) = {
            let inner = lock(&self.inner);
            if inner.closed {
                return Err(Error::PubSubClosed);
            }
            match &inner.active {
                Some(active) => (active.tx.clone(), active.closed.clone()),
                None => {
                    trace!("no subscriber, dropping event");
                    return Ok(());
                }
            }
        };

        tokio::select! {
            biased;
            _ = closed.cancelled() => {
                trace!("subscriber closed while publishing, dropping event");
            }
            result = tx.send(event) => {
                if result.is_err() {
                    trace!("subscriber gone, dropping event");
                }
            }
        }

        Ok(())
    }

    /// Whether a subscriber is currently registered
    pub fn has_subscriber(&self) -> bool {
        lock(&self.inner).active.is_some()
    }

    /// Permanently close the pubsub
    ///
    /// Any active subscription is closed; it can still drain what is
    /// already buffered. Closing twice is a no-op.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        if inner.closed {
            return;
        }

        inner.closed = true;
        if let Some(active) = inner.active.take() {
            debug!("closing pubsub, force-closing subscriber {}", active.id);
            active.closed.cancel();
        }
    }
}

#[async_trait]
impl Publisher for PubSub<Event> {
    async fn publish(&self, event: Event) -> Result<()> {
        PubSub::publish(self, event).await
    }
}

/// Receiving half handed to the subscriber
///
/// Dropping a subscription cancels it.
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    closed: CancellationToken,
    /// Registration id and owning pubsub; `None` for rejected subscriptions
    slot: Option<(u64, Weak<Mutex<Inner<T>>>)>,
}

impl<T> Subscription<T> {
    /// Receive the next event in publish order
    ///
    /// Once the subscription is closed, or the pubsub is dropped, the
    /// remaining buffer is drained, after which `None` is returned.
    pub async fn recv(&mut self) -> Option<T> {
        let event = tokio::select! {
            biased;
            event = self.rx.recv() => event,
            _ = self.closed.cancelled() => self.rx.try_recv().ok(),
        };

        // Drained after close, or every sender is gone
        if event.is_none() {
            self.closed.cancel();
        }
        event
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Release the subscriber slot
    ///
    /// Idempotent. Does nothing for a subscription that was rejected.
    pub fn cancel(&self) {
        let Some((id, inner)) = &self.slot else {
            return;
        };

        if let Some(inner) = inner.upgrade() {
            let mut inner = lock(&inner);
            if inner.active.as_ref().is_some_and(|active| active.id == *id) {
                inner.active = None;
                trace!("subscriber {id} cancelled");
            }
        }
        self.closed.cancel();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
