pub mod task;

use std::future::Future;

use tokio::sync::mpsc;

use task::Delivery;

/// Sending half of the delivery queue, shared by request handlers.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    tx: mpsc::UnboundedSender<Delivery>,
}

pub type DeliveryReceiver = mpsc::UnboundedReceiver<Delivery>;

pub fn channel() -> (DeliveryQueue, DeliveryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliveryQueue { tx }, rx)
}

impl DeliveryQueue {
    /// Returns false once the worker has stopped.
    pub fn enqueue(&self, delivery: Delivery) -> bool {
        tracing::info!(task = %delivery.description(), "Enqueuing delivery");
        self.tx.send(delivery).is_ok()
    }
}

/// Handle deliveries one at a time, in arrival order, until every sender is gone.
pub async fn run_worker<F, Fut>(mut rx: DeliveryReceiver, handle: F)
where
    F: Fn(Delivery) -> Fut,
    Fut: Future<Output = ()>,
{
    tracing::info!("Delivery worker started");

    while let Some(delivery) = rx.recv().await {
        tracing::info!(task = %delivery.description(), "Processing delivery");
        handle(delivery).await;
    }

    tracing::info!("Delivery worker stopped");
}
