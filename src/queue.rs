//! Delayed-delivery message queue for patient notifications
//!
//! Delivery is simulated: a worker pops a message, marks it `PROCESSING`,
//! waits a random delay and marks it `SENT`. Every transition is reported to
//! the registered listeners, which the dashboard uses to push live updates.
//!
//! ```text
//! enqueue ──▶ QUEUED ──process_next──▶ PROCESSING ──delay──▶ SENT
//!                                          │
//!                                     stop signal: abandoned, never requeued
//! ```
//!
//! The ledger of all messages is append-only and lives as long as the queue.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::models::{Message, MessageStatus};

/// Default lower bound of the simulated delivery delay
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(5);

/// Default upper bound of the simulated delivery delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(20);

/// Default time `process_next` waits for a message before giving up
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Observer invoked on every status transition
pub type MessageListener = Arc<dyn Fn(&Message) -> anyhow::Result<()> + Send + Sync>;

/// Inclusive range the simulated delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Create a range, swapping the bounds if given in reverse
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A range that never delays
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay uniformly from the range
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY, DEFAULT_MAX_DELAY)
    }
}

#[derive(Default)]
struct Ledger {
    seq: u64,
    messages: Vec<Message>,
    listeners: Vec<MessageListener>,
}

struct Inner {
    ledger: Mutex<Ledger>,
    pending_tx: mpsc::UnboundedSender<u64>,
    pending_rx: AsyncMutex<mpsc::UnboundedReceiver<u64>>,
    delay: DelayRange,
    poll_interval: Duration,
}

/// Unbounded queue of patient messages with simulated delivery
#[derive(Clone)]
pub struct MessageQueue {
    inner: Arc<Inner>,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new(DelayRange::default())
    }
}

impl MessageQueue {
    pub fn new(delay: DelayRange) -> Self {
        Self::with_poll_interval(delay, DEFAULT_POLL_INTERVAL)
    }

    /// Create a queue whose `process_next` waits `poll_interval` for work
    pub fn with_poll_interval(delay: DelayRange, poll_interval: Duration) -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                ledger: Mutex::new(Ledger::default()),
                pending_tx,
                pending_rx: AsyncMutex::new(pending_rx),
                delay,
                poll_interval,
            }),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.inner
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a message for delivery
    ///
    /// Listeners observe the `QUEUED` state before this returns, and before
    /// any worker can pick the message up.
    pub fn enqueue(&self, patient_id: impl Into<String>, content: impl Into<String>) -> Message {
        let (message, listeners) = {
            let mut ledger = self.ledger();
            ledger.seq += 1;

            let message = Message {
                id: ledger.seq,
                patient_id: patient_id.into(),
                content: content.into(),
                status: MessageStatus::Queued,
                queued_at: Utc::now(),
                sent_at: None,
            };
            ledger.messages.push(message.clone());

            (message, ledger.listeners.clone())
        };
        debug!("queued message {} for {}", message.id, message.patient_id);

        notify(&listeners, &message);

        // The receiver lives as long as `inner`, so this cannot fail
        let _ = self.inner.pending_tx.send(message.id);

        message
    }

    /// Deliver the next queued message
    ///
    /// Waits up to the poll interval for work and returns `None` if nothing
    /// arrived or `stop` fired. If `stop` fires during the delivery delay the
    /// message is abandoned in `PROCESSING` and `None` is returned.
    pub async fn process_next(&self, stop: &CancellationToken) -> Result<Option<Message>> {
        let id = {
            let mut pending = self.inner.pending_rx.lock().await;
            tokio::select! {
                biased;
                _ = stop.cancelled() => return Ok(None),
                next = tokio::time::timeout(self.inner.poll_interval, pending.recv()) => {
                    match next {
                        Ok(Some(id)) => id,
                        Ok(None) | Err(_) => return Ok(None),
                    }
                }
            }
        };

        let processing = self.transition(id, MessageStatus::Processing)?;

        let delay = self.inner.delay.sample();
        trace!("delivering message {id} in {delay:?}");

        tokio::select! {
            biased;
            _ = stop.cancelled() => {
                debug!("stop requested, abandoning message {} mid-delivery", processing.id);
                return Ok(None);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let sent = self.transition(id, MessageStatus::Sent)?;
        Ok(Some(sent))
    }

    /// Advance a ledger entry and notify listeners outside the lock
    fn transition(&self, id: u64, status: MessageStatus) -> Result<Message> {
        let (message, listeners) = {
            let mut ledger = self.ledger();
            let message = ledger
                .messages
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or(Error::UnknownMessage(id))?;

            let from = message.status;
            if !message.advance(status, Utc::now()) {
                return Err(Error::InvalidTransition {
                    id,
                    from,
                    to: status,
                });
            }

            (message.clone(), ledger.listeners.clone())
        };
        trace!("message {id} is now {status}");

        notify(&listeners, &message);
        Ok(message)
    }

    /// Snapshot of every message ever queued, in insertion order
    pub fn list_messages(&self) -> Vec<Message> {
        self.ledger().messages.clone()
    }

    /// Register an observer for status transitions
    ///
    /// Listeners run synchronously in registration order on the thread that
    /// caused the transition. Errors and panics are logged and swallowed.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&Message) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.ledger().listeners.push(Arc::new(listener));
    }
}

fn notify(listeners: &[MessageListener], message: &Message) {
    for (index, listener) in listeners.iter().enumerate() {
        match catch_unwind(AssertUnwindSafe(|| listener(message))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("message listener {index} failed: {e:#}"),
            Err(_) => warn!("message listener {index} panicked"),
        }
    }
}
