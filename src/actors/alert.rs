//! AlertWorker - Turns abnormal vitals into alerts
//!
//! The worker is the sole subscriber of the vitals pubsub. For every
//! `VITAL_RECEIVED` event whose reading is abnormal it stores an `ACTIVE`
//! alert and, when wired to a message queue, asks the patient to retake
//! their vitals.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ── subscribes ──▶ run(stop)
//!                           │  stop fired            → exit
//!                           │  subscription drained  → exit
//!                           ▼
//!                       cancel subscription
//! ```
//!
//! Store failures (typically the store closing during shutdown) are logged
//! and never end the loop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::models::{Alert, Event, EventKind};
use crate::pubsub::{PubSub, Subscription};
use crate::queue::MessageQueue;
use crate::storage::Store;

/// Default buffer size of the worker's subscription
pub const DEFAULT_ALERT_BUFFER: usize = 16;

/// Background consumer evaluating vitals
pub struct AlertWorker {
    /// Subscription to the vitals pubsub
    subscription: Subscription<Event>,

    /// Destination for raised alerts
    store: Arc<dyn Store>,

    /// Optional queue for patient notifications
    messages: Option<MessageQueue>,
}

impl AlertWorker {
    /// Create a worker, subscribing to `pubsub` with the given buffer size
    ///
    /// If another subscriber already holds the slot, the worker's
    /// subscription is closed and `run` exits immediately.
    pub fn new(pubsub: &PubSub<Event>, store: Arc<dyn Store>, buffer: usize) -> Self {
        let subscription = pubsub.subscribe(buffer);
        if subscription.is_closed() {
            warn!("alert worker could not subscribe, pubsub is closed or taken");
        }

        Self {
            subscription,
            store,
            messages: None,
        }
    }

    /// Notify patients through `queue` whenever an alert is raised
    pub fn with_message_queue(mut self, queue: MessageQueue) -> Self {
        self.messages = Some(queue);
        self
    }

    /// Spawn the worker on the Tokio runtime
    pub fn spawn(self, stop: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    /// Run the worker's main loop
    #[instrument(skip_all)]
    pub async fn run(mut self, stop: CancellationToken) {
        debug!("starting alert worker");

        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => {
                    debug!("stop requested");
                    break;
                }

                event = self.subscription.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            debug!("subscription closed and drained");
                            break;
                        }
                    }
                }
            }
        }

        self.subscription.cancel();
        debug!("alert worker stopped");
    }

    /// Handle a single event
    #[instrument(skip_all, fields(vital_id = event.vital.id))]
    fn handle_event(&self, event: Event) {
        if event.kind != EventKind::VitalReceived {
            return;
        }

        let vital = event.vital;
        if !vital.is_abnormal() {
            trace!("vital within limits");
            return;
        }

        let alert = match self.store.add_alert(Alert::for_vital(&vital)) {
            Ok(alert) => alert,
            Err(e) => {
                warn!("alert worker failed to store alert: {e}");
                return;
            }
        };

        info!("alert {} for {}: {}", alert.id, alert.patient_id, alert.reason);

        if let Some(queue) = &self.messages {
            let content = format!("Alert: {}. Please retake your vitals.", alert.reason);
            queue.enqueue(alert.patient_id, content);
        }
    }
}
