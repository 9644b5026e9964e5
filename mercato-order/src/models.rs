use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercato_catalog::PriceSnapshot;
use mercato_shared::{Lifecycle, Slug};

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    InDelivery,
    Delivered,
    Canceled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::InDelivery => "in_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

/// The single source of truth for a customer's purchase.
///
/// Mutated only through the transition services; the mutators below are
/// crate-private so no other crate can bypass a guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub slug: Slug,
    pub customer: Slug,
    pub supermarket: Slug,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub is_canceled: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub is_refunded: bool,
    pub refunded_at: Option<DateTime<Utc>>,
    pub payment: Option<Payment>,
    pub lifecycle: Lifecycle,
}

impl Order {
    pub fn new(customer: Slug, supermarket: Slug, now: DateTime<Utc>) -> Self {
        Self {
            slug: Slug::new("ord"),
            customer,
            supermarket,
            items: Vec::new(),
            total_cents: 0,
            status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            is_canceled: false,
            canceled_at: None,
            is_refunded: false,
            refunded_at: None,
            payment: None,
            lifecycle: Lifecycle::new(now),
        }
    }

    /// Add a line item, keeping the total in lock-step.
    pub fn add_item(&mut self, item: OrderItem, now: DateTime<Utc>) {
        self.total_cents += item.line_total_cents;
        self.items.push(item);
        self.lifecycle.touch(now);
    }

    pub(crate) fn record_payment(&mut self, payment: Payment, now: DateTime<Utc>) {
        self.payment = Some(payment);
        self.is_paid = true;
        self.paid_at = Some(now);
        self.status = OrderStatus::Paid;
        self.lifecycle.touch(now);
    }

    /// Reverse a payment: the order returns to exactly its pre-payment
    /// shape and the deleted record is handed back to the caller.
    pub(crate) fn revoke_payment(&mut self, now: DateTime<Utc>) -> Option<Payment> {
        let payment = self.payment.take()?;
        self.is_paid = false;
        self.paid_at = None;
        self.status = OrderStatus::Pending;
        self.lifecycle.touch(now);
        Some(payment)
    }

    pub(crate) fn mark_canceled(&mut self, now: DateTime<Utc>) {
        self.is_canceled = true;
        self.canceled_at = Some(now);
        self.status = OrderStatus::Canceled;
        self.lifecycle.touch(now);
    }

    /// Reached only through the delivery workflow's cascade.
    pub(crate) fn mark_delivered(&mut self, now: DateTime<Utc>) {
        self.is_delivered = true;
        self.delivered_at = Some(now);
        self.status = OrderStatus::Delivered;
        self.lifecycle.touch(now);
    }

    pub(crate) fn mark_refunded(&mut self, now: DateTime<Utc>) {
        self.is_refunded = true;
        self.refunded_at = Some(now);
        self.status = OrderStatus::Refunded;
        self.lifecycle.touch(now);
    }

    /// Courier pickup moves the order into `in_delivery`.
    pub(crate) fn begin_delivery(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::InDelivery;
        self.lifecycle.touch(now);
    }

    pub(crate) fn soft_remove(&mut self, now: DateTime<Utc>) {
        self.lifecycle.delete(now);
    }

    /// Recompute every line and the order total from the captured unit
    /// prices. Idempotent: repeated calls always land on the same figures.
    pub fn recalculate_total(&mut self) -> i64 {
        for item in &mut self.items {
            item.recalculate();
        }
        self.total_cents = self.items.iter().map(|i| i.line_total_cents).sum();
        self.total_cents
    }
}

/// One product line within an order. The unit price is captured when the
/// order is created and never re-queried from the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub slug: Slug,
    pub order: Slug,
    pub product: Slug,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn from_snapshot(order: &Slug, snapshot: PriceSnapshot, now: DateTime<Utc>) -> Self {
        let line_total_cents = snapshot.line_total_cents();
        Self {
            slug: Slug::new("itm"),
            order: order.clone(),
            product: snapshot.product,
            product_name: snapshot.product_name,
            quantity: snapshot.quantity,
            unit_price_cents: snapshot.unit_price_cents,
            line_total_cents,
            created_at: now,
        }
    }

    /// Recompute the cached line total from quantity and captured price.
    pub fn recalculate(&mut self) -> i64 {
        self.line_total_cents = i64::from(self.quantity) * self.unit_price_cents;
        self.line_total_cents
    }
}

/// Payment record, exactly one per paid order, owned by its order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub slug: Slug,
    pub order: Slug,
    pub method: String,
    pub amount_cents: i64,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}
