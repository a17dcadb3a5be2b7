use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::clients::{MenuClient, OrderClient, ProfileClient};
use crate::config::SystemConfig;
use crate::domain::{MenuCategory, Order, UserProfile};
use crate::jobs::{ExpiryQueue, PurgeJob};
use crate::store::StoreActor;

/// The assembled application: one store actor per collection, the two
/// background jobs, and the clients handed out to callers.
///
/// Responsible for starting the actors, wiring them together, and
/// handling shutdown.
pub struct OrderSystem {
    pub orders: OrderClient,
    pub profiles: ProfileClient,
    pub menu: MenuClient,
    shutdown: watch::Sender<bool>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

/// Store-assigned ids: a per-collection counter behind a prefix.
fn sequential_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        format!("{}_{}", prefix, id)
    }
}

impl OrderSystem {
    pub fn new(config: SystemConfig) -> Self {
        // 1. One store actor per collection.
        let (order_actor, order_store) =
            StoreActor::<Order>::new(config.buffer_size, sequential_ids("order"));
        let (profile_actor, profile_store) =
            StoreActor::<UserProfile>::new(config.buffer_size, sequential_ids("profile"));
        let (menu_actor, menu_store) =
            StoreActor::<MenuCategory>::new(config.buffer_size, sequential_ids("category"));

        // 2. Delivered-order expiry queue, deleting through its own
        // store handle.
        let (expiry_queue, expiry_client) =
            ExpiryQueue::new(config.buffer_size, order_store.clone(), config.delivered_ttl);

        let orders = OrderClient::new(order_store, expiry_client);
        let profiles = ProfileClient::new(profile_store);
        let menu = MenuClient::new(menu_store);

        // 3. Daily purge sweep over the orders collection.
        let (shutdown, shutdown_rx) = watch::channel(false);
        let purge = PurgeJob::new(orders.clone(), config.purge_hour, shutdown_rx);

        let handles = vec![
            tokio::spawn(order_actor.run()),
            tokio::spawn(profile_actor.run()),
            tokio::spawn(menu_actor.run()),
            tokio::spawn(expiry_queue.run()),
            tokio::spawn(purge.run()),
        ];

        Self {
            orders,
            profiles,
            menu,
            shutdown,
            handles,
        }
    }

    /// Stops the jobs and the store actors and waits for them.
    ///
    /// The purge job stops on the shutdown signal; dropping the clients
    /// then closes the expiry and store channels in dependency order.
    /// Live subscriptions hold a store handle of their own, so callers
    /// must drop them first or shutdown will wait on them.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let _ = self.shutdown.send(true);

        drop(self.orders);
        drop(self.profiles);
        drop(self.menu);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
