use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercato_shared::{GeoPoint, Lifecycle, Slug};

/// Delivery status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
    Canceled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Canceled => "canceled",
        }
    }
}

/// Courier assignment for one order, tracked from pickup to a terminal
/// state. Terminal transitions always update the linked order in the same
/// store transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub slug: Slug,
    pub order: Slug,
    pub courier: Slug,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
    pub address: GeoPoint,
    pub lifecycle: Lifecycle,
}

impl Delivery {
    pub fn new(order: Slug, courier: Slug, address: GeoPoint, now: DateTime<Utc>) -> Self {
        Self {
            slug: Slug::new("dlv"),
            order,
            courier,
            pickup_time: None,
            delivery_time: None,
            status: DeliveryStatus::Pending,
            address,
            lifecycle: Lifecycle::new(now),
        }
    }

    pub(crate) fn pick_up(&mut self, now: DateTime<Utc>) {
        self.status = DeliveryStatus::InTransit;
        self.pickup_time = Some(now);
        self.lifecycle.touch(now);
    }

    pub(crate) fn deliver(&mut self, now: DateTime<Utc>) {
        self.status = DeliveryStatus::Delivered;
        self.delivery_time = Some(now);
        self.lifecycle.touch(now);
    }

    pub(crate) fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = DeliveryStatus::Canceled;
        self.lifecycle.touch(now);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            DeliveryStatus::Delivered | DeliveryStatus::Canceled
        )
    }
}

/// Customer rating for a completed delivery; one per (delivery, author).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub slug: Slug,
    pub delivery: Slug,
    pub rating: u8,
    pub comment: String,
    pub author: Slug,
    pub created_at: DateTime<Utc>,
}

impl DeliveryNote {
    pub fn new(
        delivery: Slug,
        author: Slug,
        rating: u8,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            slug: Slug::new("note"),
            delivery,
            rating,
            comment: comment.into(),
            author,
            created_at: now,
        }
    }
}
