use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::store::Document;

/// Sentinel customer id for orders placed without a signed-in account.
pub const GUEST_CUSTOMER: &str = "guest";

/// The fulfillment stage of an order. Strictly linear: no branches,
/// no cancellation state, no moving backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Order Placed")]
    Placed,
    Preparing,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    /// Returns the single next stage in the sequence, or `None` once
    /// the order has been delivered.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Placed => Some(Self::Preparing),
            Self::Preparing => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Placed => "Order Placed",
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
        };
        f.write_str(label)
    }
}

/// A priced extra attached to a line item (an addon or a crust choice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub name: String,
    pub price: u32,
}

/// One entry of an order's cart. `line_total` is recomputed by the store
/// on creation; values supplied by callers are never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: u32,
    pub quantity: u32,
    pub size: Option<String>,
    pub crust: Option<Selection>,
    pub addons: Vec<Selection>,
    pub line_total: u32,
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_price: u32, quantity: u32) -> Self {
        Self {
            name: name.into(),
            unit_price,
            quantity,
            size: None,
            crust: None,
            addons: Vec::new(),
            line_total: 0,
        }
        .normalized()
    }

    /// Recomputes `line_total`: base price plus every addon and the
    /// crust surcharge, each counted once per quantity.
    pub fn normalized(mut self) -> Self {
        let addons: u32 = self.addons.iter().map(|a| a.price).sum();
        let crust = self.crust.as_ref().map_or(0, |c| c.price);
        self.line_total = (self.unit_price + addons + crust) * self.quantity;
        self
    }
}

/// Where and to whom an order is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub instructions: Option<String>,
    pub university_gate: Option<String>,
}

/// A placed purchase request tracked through the fulfillment lifecycle.
///
/// Write-once except for `status` and `updated_at`, which only the
/// status-advance path mutates. `total_price` is fixed at creation time
/// and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<LineItem>,
    pub total_price: u32,
    pub delivery: DeliveryDetails,
    pub status: OrderStatus,
    pub order_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for placing a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer_id: String,
    pub items: Vec<LineItem>,
    pub delivery: DeliveryDetails,
}

impl OrderCreate {
    pub fn guest(items: Vec<LineItem>, delivery: DeliveryDetails) -> Self {
        Self {
            customer_id: GUEST_CUSTOMER.to_string(),
            items,
            delivery,
        }
    }
}

/// Patch applied by the admin status-advance action. The update hook
/// refuses anything other than the immediate next status.
#[derive(Debug, Clone)]
pub struct OrderPatch {
    pub status: OrderStatus,
}

/// Live-query filter over the orders collection. All set conditions must
/// hold; the default filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub exclude_status: Option<OrderStatus>,
    pub created_after: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            ..Self::default()
        }
    }

    /// The admin board's live view: everything still in flight.
    pub fn undelivered() -> Self {
        Self {
            exclude_status: Some(OrderStatus::Delivered),
            ..Self::default()
        }
    }

    pub fn since(created_after: DateTime<Utc>) -> Self {
        Self {
            created_after: Some(created_after),
            ..Self::default()
        }
    }
}

impl Document for Order {
    type Id = String;
    type CreatePayload = OrderCreate;
    type Patch = OrderPatch;
    type Filter = OrderFilter;
    type SortKey = DateTime<Utc>;
    type Error = OrderError;

    const COLLECTION: &'static str = "orders";

    fn id(&self) -> &String {
        &self.id
    }

    /// Builds the stored order: normalizes every line item, fixes the
    /// total, stamps both timestamps, and starts the lifecycle at
    /// `Placed`.
    fn from_create(id: String, payload: OrderCreate) -> Result<Self, OrderError> {
        if payload.items.is_empty() {
            return Err(OrderError::Validation("order has no line items".into()));
        }
        if payload.delivery.name.trim().is_empty() {
            return Err(OrderError::Validation("customer name is required".into()));
        }
        if payload.delivery.address.trim().is_empty() {
            return Err(OrderError::Validation("delivery address is required".into()));
        }

        let items: Vec<LineItem> = payload
            .items
            .into_iter()
            .map(LineItem::normalized)
            .collect();
        let total_price = items.iter().map(|item| item.line_total).sum();
        let now = Utc::now();

        Ok(Self {
            id,
            customer_id: payload.customer_id,
            items,
            total_price,
            delivery: payload.delivery,
            status: OrderStatus::Placed,
            order_number: Some(order_number(now)),
            created_at: now,
            updated_at: now,
        })
    }

    /// Advances the status. The requested target must equal
    /// `next(current)`; anything else, including any write to a
    /// delivered order, is refused and leaves the order untouched.
    fn on_update(&mut self, patch: OrderPatch) -> Result<(), OrderError> {
        match self.status.next() {
            Some(next) if next == patch.status => {
                self.status = patch.status;
                self.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(OrderError::InvalidTransition {
                from: self.status,
                to: patch.status,
            }),
        }
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        if let Some(customer_id) = &filter.customer_id {
            if &self.customer_id != customer_id {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        if let Some(excluded) = filter.exclude_status {
            if self.status == excluded {
                return false;
            }
        }
        if let Some(created_after) = filter.created_after {
            if self.created_at < created_after {
                return false;
            }
        }
        true
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Human-readable display token derived from the creation instant.
/// Display only; uniqueness is not enforced.
fn order_number(at: DateTime<Utc>) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = at.timestamp_millis().unsigned_abs();
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            name: "Alice".into(),
            phone: "9999999999".into(),
            address: "A-10, Sector 62".into(),
            instructions: None,
            university_gate: None,
        }
    }

    #[test]
    fn status_sequence_is_strictly_linear() {
        let mut status = OrderStatus::Placed;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            status = next;
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                OrderStatus::Placed,
                OrderStatus::Preparing,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ]
        );
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn status_labels_match_wire_format() {
        assert_eq!(OrderStatus::Placed.to_string(), "Order Placed");
        assert_eq!(OrderStatus::OutForDelivery.to_string(), "Out for Delivery");
    }

    #[test]
    fn line_total_counts_addons_and_crust_per_quantity() {
        let item = LineItem {
            name: "Farmhouse".into(),
            unit_price: 250,
            quantity: 2,
            size: Some("Medium".into()),
            crust: Some(Selection {
                name: "Cheese Burst".into(),
                price: 60,
            }),
            addons: vec![
                Selection {
                    name: "Extra Cheese".into(),
                    price: 40,
                },
                Selection {
                    name: "Olives".into(),
                    price: 30,
                },
            ],
            line_total: 0,
        }
        .normalized();
        // (250 + 40 + 30 + 60) * 2
        assert_eq!(item.line_total, 760);
    }

    #[test]
    fn create_computes_total_and_starts_placed() {
        let payload = OrderCreate::guest(
            vec![
                LineItem::new("Margherita", 250, 1),
                LineItem::new("Coke", 40, 2),
            ],
            delivery(),
        );
        let order = Order::from_create("order_1".into(), payload).unwrap();
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.total_price, 330);
        assert_eq!(order.customer_id, GUEST_CUSTOMER);
        assert_eq!(order.created_at, order.updated_at);
        assert!(order.order_number.is_some());
    }

    #[test]
    fn create_rejects_empty_cart_and_blank_delivery_fields() {
        let empty = OrderCreate::guest(Vec::new(), delivery());
        assert!(matches!(
            Order::from_create("order_1".into(), empty),
            Err(OrderError::Validation(_))
        ));

        let mut blank_name = delivery();
        blank_name.name = "  ".into();
        let payload = OrderCreate::guest(vec![LineItem::new("Coke", 40, 1)], blank_name);
        assert!(matches!(
            Order::from_create("order_2".into(), payload),
            Err(OrderError::Validation(_))
        ));

        let mut blank_address = delivery();
        blank_address.address = String::new();
        let payload = OrderCreate::guest(vec![LineItem::new("Coke", 40, 1)], blank_address);
        assert!(matches!(
            Order::from_create("order_3".into(), payload),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn update_refuses_skips_and_terminal_writes() {
        let payload = OrderCreate::guest(vec![LineItem::new("Coke", 40, 1)], delivery());
        let mut order = Order::from_create("order_1".into(), payload).unwrap();

        // Skipping a stage is refused.
        let err = order
            .on_update(OrderPatch {
                status: OrderStatus::Delivered,
            })
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Placed,
                to: OrderStatus::Delivered,
            }
        );
        assert_eq!(order.status, OrderStatus::Placed);

        // Walking the sequence works.
        for status in [
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            order.on_update(OrderPatch { status }).unwrap();
        }
        assert_eq!(order.status, OrderStatus::Delivered);

        // Any write to a delivered order is refused.
        let err = order
            .on_update(OrderPatch {
                status: OrderStatus::Delivered,
            })
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[test]
    fn filter_matching() {
        let payload = OrderCreate {
            customer_id: "user_7".into(),
            items: vec![LineItem::new("Coke", 40, 1)],
            delivery: delivery(),
        };
        let order = Order::from_create("order_1".into(), payload).unwrap();

        assert!(order.matches(&OrderFilter::default()));
        assert!(order.matches(&OrderFilter::for_customer("user_7")));
        assert!(!order.matches(&OrderFilter::for_customer("user_8")));
        assert!(order.matches(&OrderFilter::undelivered()));
        assert!(!order.matches(&OrderFilter {
            status: Some(OrderStatus::Delivered),
            ..OrderFilter::default()
        }));
        assert!(order.matches(&OrderFilter::since(order.created_at)));
        assert!(!order.matches(&OrderFilter::since(
            order.created_at + chrono::Duration::seconds(1)
        )));
    }
}
