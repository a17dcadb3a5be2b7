use tracing::{info, instrument, warn};

use crate::domain::{Order, OrderCreate, OrderFilter, OrderPatch, OrderStatus};
use crate::error::OrderError;
use crate::jobs::ExpiryClient;
use crate::store::{StoreClient, Subscription};

/// Repository-level client for the orders collection.
///
/// Wraps the raw store client with the checkout entry point, the
/// customer/admin list views, the status-advance action, and the
/// delivered-order expiry hand-off.
#[derive(Clone)]
pub struct OrderClient {
    inner: StoreClient<Order>,
    expiry: ExpiryClient,
}

impl OrderClient {
    pub fn new(inner: StoreClient<Order>, expiry: ExpiryClient) -> Self {
        Self { inner, expiry }
    }

    /// Places a new order. Validation (non-empty cart, customer name,
    /// delivery address) happens in the store's create hook; the stored
    /// order comes back with its id, `Placed` status, and fixed total.
    #[instrument(skip(self, payload))]
    pub async fn place_order(&self, payload: OrderCreate) -> Result<Order, OrderError> {
        let order = self
            .inner
            .create(payload)
            .await
            .map_err(OrderError::from)?;
        info!(
            order_id = %order.id,
            customer = %order.customer_id,
            total = order.total_price,
            "order placed"
        );
        Ok(order)
    }

    /// A customer's own orders, newest first. Empty vec when none.
    #[instrument(skip(self))]
    pub async fn list_by_customer(&self, customer_id: String) -> Result<Vec<Order>, OrderError> {
        self.inner
            .query(OrderFilter::for_customer(customer_id))
            .await
            .map_err(OrderError::from)
    }

    /// Admin-side listing, newest first, optionally narrowed by status
    /// or creation-date lower bound.
    #[instrument(skip(self, filter))]
    pub async fn list_all(&self, filter: OrderFilter) -> Result<Vec<Order>, OrderError> {
        self.inner.query(filter).await.map_err(OrderError::from)
    }

    /// Advances an order to `target`, which must be the immediate next
    /// status; the store's update hook refuses anything else. On
    /// reaching `Delivered`, hands the order to the expiry queue for
    /// deferred deletion.
    #[instrument(skip(self))]
    pub async fn advance(
        &self,
        id: String,
        target: OrderStatus,
        operator: &str,
    ) -> Result<Order, OrderError> {
        let order = self
            .inner
            .update(id, OrderPatch { status: target })
            .await
            .map_err(OrderError::from)?;
        info!(
            order_id = %order.id,
            status = %order.status,
            operator,
            "order status updated"
        );
        if order.status.is_terminal() {
            // Best effort: a lost timer is caught by the daily purge.
            if let Err(e) = self.expiry.schedule(order.id.clone()).await {
                warn!(
                    order_id = %order.id,
                    error = %e,
                    "failed to schedule delivered-order expiry"
                );
            }
        }
        Ok(order)
    }

    /// Opens a live query. Each consumer gets its own uncoordinated
    /// stream of full result-set snapshots.
    #[instrument(skip(self, filter))]
    pub async fn subscribe(&self, filter: OrderFilter) -> Result<Subscription<Order>, OrderError> {
        self.inner.subscribe(filter).await.map_err(OrderError::from)
    }
}

crate::impl_client_methods!(OrderClient, Order, OrderError, order);
