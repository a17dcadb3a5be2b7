use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument, warn};

use crate::domain::Order;
use crate::error::OrderError;
use crate::store::StoreClient;

#[derive(Debug)]
pub enum ExpiryRequest {
    Schedule { order_id: String },
}

/// Actor that deletes delivered orders after a fixed delay.
///
/// Scheduled entries live in an in-process due-time heap and do not
/// survive a restart; the daily purge is the backstop for anything
/// lost. Replaces the original's fire-and-forget timers with one
/// explicit queue.
pub struct ExpiryQueue {
    receiver: mpsc::Receiver<ExpiryRequest>,
    store: StoreClient<Order>,
    delay: Duration,
    due: BinaryHeap<Reverse<(Instant, String)>>,
}

impl ExpiryQueue {
    pub fn new(
        buffer_size: usize,
        store: StoreClient<Order>,
        delay: Duration,
    ) -> (Self, ExpiryClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let queue = Self {
            receiver,
            store,
            delay,
            due: BinaryHeap::new(),
        };
        (queue, ExpiryClient { sender })
    }

    #[instrument(name = "expiry_queue", skip(self))]
    pub async fn run(mut self) {
        info!(delay_secs = self.delay.as_secs(), "expiry queue starting");
        loop {
            let next_due = self.due.peek().map(|Reverse((at, _))| *at);
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(ExpiryRequest::Schedule { order_id }) => {
                        debug!(order_id = %order_id, "delivered order queued for expiry");
                        self.due.push(Reverse((Instant::now() + self.delay, order_id)));
                    }
                    None => break,
                },
                _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                    if let Some(Reverse((_, order_id))) = self.due.pop() {
                        // Fire and forget: a failed delete just means the
                        // order survives until the next purge.
                        match self.store.delete(order_id.clone()).await {
                            Ok(()) => info!(order_id = %order_id, "expired delivered order removed"),
                            Err(e) => warn!(
                                order_id = %order_id,
                                error = %e,
                                "failed to expire delivered order"
                            ),
                        }
                    }
                }
            }
        }
        info!("expiry queue stopped");
    }
}

/// Cloneable handle for scheduling a delivered order's deletion.
#[derive(Clone)]
pub struct ExpiryClient {
    sender: mpsc::Sender<ExpiryRequest>,
}

impl ExpiryClient {
    pub fn new(sender: mpsc::Sender<ExpiryRequest>) -> Self {
        Self { sender }
    }

    pub async fn schedule(&self, order_id: String) -> Result<(), OrderError> {
        self.sender
            .send(ExpiryRequest::Schedule { order_id })
            .await
            .map_err(|_| OrderError::RemoteUnavailable("expiry queue closed".into()))
    }
}
