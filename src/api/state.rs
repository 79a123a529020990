//! API shared state

use tokio::sync::broadcast;

use crate::models::Message;
use crate::queue::MessageQueue;
use crate::service::VitalService;

/// Capacity of the message update fan-out; slower clients skip updates
const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Vital ingestion and listing
    pub service: VitalService,

    /// Patient message queue
    pub messages: MessageQueue,

    /// Broadcast sender for message status updates (for WebSocket streaming)
    pub message_tx: broadcast::Sender<Message>,
}

impl ApiState {
    /// Create the API state and register a queue listener that forwards
    /// every message transition to connected clients
    pub fn new(service: VitalService, messages: MessageQueue) -> Self {
        let (message_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let tx = message_tx.clone();
        messages.add_listener(move |message| {
            // No connected clients is not an error
            let _ = tx.send(message.clone());
            Ok(())
        });

        Self {
            service,
            messages,
            message_tx,
        }
    }
}
