//! MessageWorker - Drives simulated delivery of queued patient messages

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::queue::MessageQueue;

/// Background consumer of the message queue
pub struct MessageWorker {
    queue: MessageQueue,
}

impl MessageWorker {
    pub fn new(queue: MessageQueue) -> Self {
        Self { queue }
    }

    /// Spawn the worker on the Tokio runtime
    pub fn spawn(self, stop: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    /// Process messages until `stop` fires
    ///
    /// A failing iteration is logged and the loop carries on.
    #[instrument(skip_all)]
    pub async fn run(self, stop: CancellationToken) {
        debug!("starting message worker");

        while !stop.is_cancelled() {
            match self.queue.process_next(&stop).await {
                Ok(Some(message)) => {
                    info!("sent message {} to {}: {}", message.id, message.patient_id, message.content);
                }
                Ok(None) => {}
                Err(e) => warn!("message worker error: {e}"),
            }
        }

        debug!("message worker stopped");
    }
}
