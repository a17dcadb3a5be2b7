use std::time::Duration;

use chrono::{DateTime, Days, Local};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::clients::OrderClient;
use crate::domain::OrderFilter;
use crate::error::OrderError;

/// Daily unconditional sweep of the orders collection, fired at a
/// fixed wall-clock hour (midnight by default).
pub struct PurgeJob {
    orders: OrderClient,
    hour: u32,
    shutdown: watch::Receiver<bool>,
}

impl PurgeJob {
    pub fn new(orders: OrderClient, hour: u32, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            orders,
            hour: hour.min(23),
            shutdown,
        }
    }

    /// Calendar loop: sleep until the next run time, sweep, repeat.
    /// No retry and no partial-completion tracking; tomorrow's run
    /// catches any survivors.
    #[instrument(name = "purge_job", skip(self))]
    pub async fn run(mut self) {
        info!(hour = self.hour, "purge job starting");
        loop {
            let Some(wait) = until_next_run(Local::now(), self.hour) else {
                error!(hour = self.hour, "could not compute next purge run");
                break;
            };
            tokio::select! {
                _ = sleep(wait) => {
                    match sweep(&self.orders).await {
                        Ok(deleted) => info!(deleted, "purge sweep complete"),
                        Err(e) => warn!(error = %e, "purge sweep failed"),
                    }
                }
                _ = self.shutdown.changed() => break,
            }
        }
        info!("purge job stopped");
    }
}

/// Deletes every order currently in the collection, regardless of
/// status, and returns the count. Deliberately blunt: the whole
/// collection present at trigger time goes, not just yesterday's.
pub async fn sweep(orders: &OrderClient) -> Result<usize, OrderError> {
    let all = orders.list_all(OrderFilter::default()).await?;
    let mut deleted = 0;
    for order in &all {
        orders.delete_order(order.id.clone()).await?;
        deleted += 1;
    }
    Ok(deleted)
}

/// Time until the next wall-clock occurrence of `hour:00:00` local
/// time, strictly in the future. `None` only when `hour` is out of
/// range or the calendar arithmetic overflows.
fn until_next_run(now: DateTime<Local>, hour: u32) -> Option<Duration> {
    let today = now.date_naive().and_hms_opt(hour, 0, 0)?;
    let run_at = if now.naive_local() < today {
        today
    } else {
        today.checked_add_days(Days::new(1))?
    };
    (run_at - now.naive_local()).to_std().ok()
}
