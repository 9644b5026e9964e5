use std::collections::{HashMap, HashSet};

use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::delivery::{Delivery, DeliveryNote};
use crate::models::Order;
use mercato_core::{CoreError, CoreResult};
use mercato_shared::Slug;

/// Shared store for the order, delivery and note aggregates.
///
/// `begin` hands out the single write guard; a transition takes it, runs
/// every check, applies every mutation (cascades included) and releases.
/// Concurrent operations on the same aggregate therefore serialize, and the
/// loser of a race observes the winner's state — last writer fails, it does
/// not overwrite.
pub struct MarketStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    orders: HashMap<Slug, Order>,
    deliveries: HashMap<Slug, Delivery>,
    delivery_by_order: HashMap<Slug, Slug>,
    notes: HashMap<Slug, DeliveryNote>,
    note_authors: HashSet<(Slug, Slug)>,
    transaction_ids: HashSet<String>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Open the write transaction scoping one aggregate operation.
    pub async fn begin(&self) -> StoreTx<'_> {
        StoreTx {
            inner: self.inner.write().await,
        }
    }

    // ------------------------------------------------------------------
    // Read side. Every accessor filters soft-removed records.
    // ------------------------------------------------------------------

    pub async fn order(&self, slug: &Slug) -> CoreResult<Order> {
        let inner = self.inner.read().await;
        inner
            .orders
            .get(slug)
            .filter(|o| !o.lifecycle.is_deleted())
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("order {slug}")))
    }

    pub async fn orders(&self) -> Vec<Order> {
        let inner = self.inner.read().await;
        inner
            .orders
            .values()
            .filter(|o| !o.lifecycle.is_deleted())
            .cloned()
            .collect()
    }

    pub async fn orders_for_customer(&self, customer: &Slug) -> Vec<Order> {
        let inner = self.inner.read().await;
        inner
            .orders
            .values()
            .filter(|o| !o.lifecycle.is_deleted() && &o.customer == customer)
            .cloned()
            .collect()
    }

    pub async fn delivery(&self, slug: &Slug) -> CoreResult<Delivery> {
        let inner = self.inner.read().await;
        inner
            .deliveries
            .get(slug)
            .filter(|d| !d.lifecycle.is_deleted())
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("delivery {slug}")))
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        let inner = self.inner.read().await;
        inner
            .deliveries
            .values()
            .filter(|d| !d.lifecycle.is_deleted())
            .cloned()
            .collect()
    }

    pub async fn deliveries_for_courier(&self, courier: &Slug) -> Vec<Delivery> {
        let inner = self.inner.read().await;
        inner
            .deliveries
            .values()
            .filter(|d| !d.lifecycle.is_deleted() && &d.courier == courier)
            .cloned()
            .collect()
    }

    pub async fn notes_for_delivery(&self, delivery: &Slug) -> Vec<DeliveryNote> {
        let inner = self.inner.read().await;
        inner
            .notes
            .values()
            .filter(|n| &n.delivery == delivery)
            .cloned()
            .collect()
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write guard for one aggregate operation.
///
/// Mutations become visible when the guard drops; `commit` names that point
/// at the call site. Callers run all guard checks before the first
/// mutation, so an error return leaves no partial state behind.
pub struct StoreTx<'a> {
    inner: RwLockWriteGuard<'a, StoreInner>,
}

impl StoreTx<'_> {
    pub fn commit(self) {}

    // ---- orders ------------------------------------------------------

    pub fn order(&self, slug: &Slug) -> CoreResult<&Order> {
        self.inner
            .orders
            .get(slug)
            .filter(|o| !o.lifecycle.is_deleted())
            .ok_or_else(|| CoreError::not_found(format!("order {slug}")))
    }

    pub fn order_mut(&mut self, slug: &Slug) -> CoreResult<&mut Order> {
        self.inner
            .orders
            .get_mut(slug)
            .filter(|o| !o.lifecycle.is_deleted())
            .ok_or_else(|| CoreError::not_found(format!("order {slug}")))
    }

    pub fn insert_order(&mut self, order: Order) {
        self.inner.orders.insert(order.slug.clone(), order);
    }

    // ---- payment transaction ids ------------------------------------

    /// Claim a transaction id system-wide. Returns false when some payment
    /// already recorded it.
    pub fn claim_transaction_id(&mut self, transaction_id: &str) -> bool {
        self.inner
            .transaction_ids
            .insert(transaction_id.to_string())
    }

    /// Release an id whose payment record was deleted.
    pub fn release_transaction_id(&mut self, transaction_id: &str) {
        self.inner.transaction_ids.remove(transaction_id);
    }

    // ---- deliveries --------------------------------------------------

    pub fn delivery(&self, slug: &Slug) -> CoreResult<&Delivery> {
        self.inner
            .deliveries
            .get(slug)
            .filter(|d| !d.lifecycle.is_deleted())
            .ok_or_else(|| CoreError::not_found(format!("delivery {slug}")))
    }

    pub fn delivery_mut(&mut self, slug: &Slug) -> CoreResult<&mut Delivery> {
        self.inner
            .deliveries
            .get_mut(slug)
            .filter(|d| !d.lifecycle.is_deleted())
            .ok_or_else(|| CoreError::not_found(format!("delivery {slug}")))
    }

    /// Insert the order's delivery; each order has at most one.
    pub fn insert_delivery(&mut self, delivery: Delivery) -> CoreResult<()> {
        if self.inner.delivery_by_order.contains_key(&delivery.order) {
            return Err(CoreError::AlreadyExists(format!(
                "order {} already has a delivery",
                delivery.order
            )));
        }
        self.inner
            .delivery_by_order
            .insert(delivery.order.clone(), delivery.slug.clone());
        self.inner.deliveries.insert(delivery.slug.clone(), delivery);
        Ok(())
    }

    // ---- delivery notes ----------------------------------------------

    pub fn has_note_by(&self, delivery: &Slug, author: &Slug) -> bool {
        self.inner
            .note_authors
            .contains(&(delivery.clone(), author.clone()))
    }

    /// Insert a note; at most one per (delivery, author).
    pub fn insert_note(&mut self, note: DeliveryNote) -> CoreResult<()> {
        let key = (note.delivery.clone(), note.author.clone());
        if !self.inner.note_authors.insert(key) {
            return Err(CoreError::AlreadyExists(format!(
                "delivery {} was already rated by {}",
                note.delivery, note.author
            )));
        }
        self.inner.notes.insert(note.slug.clone(), note);
        Ok(())
    }
}
