use std::sync::Arc;

use tracing::info;

use crate::delivery::{Delivery, DeliveryNote};
use crate::models::OrderStatus;
use crate::store::MarketStore;
use mercato_core::{
    Actor, Clock, CoreError, CoreResult, Notification, NotificationSink, Role, UserDirectory,
};
use mercato_shared::{GeoPoint, Slug};

/// Application services for the delivery workflow.
///
/// Terminal delivery transitions always update the linked order inside the
/// same store transaction; a delivery can never end up delivered or
/// canceled while its order says otherwise.
pub struct DeliveryService {
    store: Arc<MarketStore>,
    directory: Arc<dyn UserDirectory>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl DeliveryService {
    pub fn new(
        store: Arc<MarketStore>,
        directory: Arc<dyn UserDirectory>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            sink,
            clock,
        }
    }

    /// Assign a courier to an order, creating the delivery in `pending`
    /// with a fresh address point.
    ///
    /// Assignment takes no position on order.status; pickup is the gate
    /// that demands a paid order.
    pub async fn assign(
        &self,
        actor: &Actor,
        order_slug: &Slug,
        courier_slug: &Slug,
        address: GeoPoint,
    ) -> CoreResult<Delivery> {
        actor.require_role(Role::Moderator, "assign a delivery")?;

        let courier = self.directory.find_by_slug(courier_slug).await?;
        if courier.role != Role::Delivery {
            return Err(CoreError::Validation(format!(
                "user {courier_slug} is not a courier"
            )));
        }
        if courier.is_blocked {
            return Err(CoreError::Validation(format!(
                "courier {courier_slug} is blocked"
            )));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await;
        tx.order(order_slug)?;

        let delivery = Delivery::new(order_slug.clone(), courier_slug.clone(), address, now);
        tx.insert_delivery(delivery.clone())?;
        tx.commit();

        info!(delivery = %delivery.slug, order = %order_slug, courier = %courier_slug, "delivery assigned");
        self.notify(
            courier_slug.clone(),
            "Delivery assigned",
            format!("You were assigned the delivery for order {order_slug}"),
            &delivery.slug,
        )
        .await;
        Ok(delivery)
    }

    /// Courier pickup. Demands a paid order, then moves the delivery to
    /// `in_transit` and the order into `in_delivery` in one transaction.
    pub async fn pick_up(&self, actor: &Actor, delivery_slug: &Slug) -> CoreResult<Delivery> {
        actor.require_role(Role::Delivery, "pick up a delivery")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let delivery = tx.delivery(delivery_slug)?;
        if delivery.courier != actor.slug {
            return Err(CoreError::Forbidden(
                "only the assigned courier may pick up this delivery".to_string(),
            ));
        }
        let order_slug = delivery.order.clone();

        let order = tx.order(&order_slug)?;
        if order.status != OrderStatus::Paid {
            return Err(CoreError::invalid_state("pick up", order.status.as_str()));
        }
        let customer = order.customer.clone();

        tx.delivery_mut(delivery_slug)?.pick_up(now);
        tx.order_mut(&order_slug)?.begin_delivery(now);
        let updated = tx.delivery(delivery_slug)?.clone();
        tx.commit();

        info!(delivery = %delivery_slug, order = %order_slug, "delivery picked up");
        self.notify(
            customer,
            "Order on its way",
            format!("Your order {order_slug} was picked up by the courier"),
            delivery_slug,
        )
        .await;
        Ok(updated)
    }

    /// Courier drop-off. Demands an order in `in_delivery` and cascades the
    /// order to `delivered` in the same transaction.
    pub async fn deliver(&self, actor: &Actor, delivery_slug: &Slug) -> CoreResult<Delivery> {
        actor.require_role(Role::Delivery, "complete a delivery")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let delivery = tx.delivery(delivery_slug)?;
        if delivery.courier != actor.slug {
            return Err(CoreError::Forbidden(
                "only the assigned courier may complete this delivery".to_string(),
            ));
        }
        let order_slug = delivery.order.clone();

        let order = tx.order(&order_slug)?;
        if order.status != OrderStatus::InDelivery {
            return Err(CoreError::invalid_state("deliver", order.status.as_str()));
        }
        let customer = order.customer.clone();

        tx.delivery_mut(delivery_slug)?.deliver(now);
        tx.order_mut(&order_slug)?.mark_delivered(now);
        let updated = tx.delivery(delivery_slug)?.clone();
        tx.commit();

        info!(delivery = %delivery_slug, order = %order_slug, "delivery completed");
        self.notify(
            customer,
            "Order delivered",
            format!("Your order {order_slug} was delivered"),
            delivery_slug,
        )
        .await;
        Ok(updated)
    }

    /// Moderator cancellation of an active delivery; the order is canceled
    /// in the same transaction.
    pub async fn cancel(&self, actor: &Actor, delivery_slug: &Slug) -> CoreResult<Delivery> {
        actor.require_role(Role::Moderator, "cancel a delivery")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let delivery = tx.delivery(delivery_slug)?;
        let order_slug = delivery.order.clone();

        let order = tx.order(&order_slug)?;
        if !matches!(order.status, OrderStatus::Paid | OrderStatus::InDelivery) {
            return Err(CoreError::invalid_state(
                "cancel the delivery of",
                order.status.as_str(),
            ));
        }
        let customer = order.customer.clone();

        tx.delivery_mut(delivery_slug)?.cancel(now);
        tx.order_mut(&order_slug)?.mark_canceled(now);
        let updated = tx.delivery(delivery_slug)?.clone();
        tx.commit();

        info!(delivery = %delivery_slug, order = %order_slug, "delivery canceled");
        self.notify(
            customer,
            "Delivery canceled",
            format!("The delivery for your order {order_slug} was canceled"),
            delivery_slug,
        )
        .await;
        Ok(updated)
    }

    /// Attach the customer's rating for a delivery; one note per
    /// (delivery, author).
    pub async fn add_note(
        &self,
        actor: &Actor,
        delivery_slug: &Slug,
        rating: u8,
        comment: String,
    ) -> CoreResult<DeliveryNote> {
        actor.require_role(Role::Customer, "rate a delivery")?;
        if !(1..=5).contains(&rating) {
            return Err(CoreError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let delivery = tx.delivery(delivery_slug)?;
        let order = tx.order(&delivery.order)?;
        if order.customer != actor.slug {
            return Err(CoreError::Forbidden(
                "only the order's customer may rate its delivery".to_string(),
            ));
        }
        if tx.has_note_by(delivery_slug, &actor.slug) {
            return Err(CoreError::AlreadyExists(format!(
                "delivery {delivery_slug} was already rated by {}",
                actor.slug
            )));
        }

        let note = DeliveryNote::new(
            delivery_slug.clone(),
            actor.slug.clone(),
            rating,
            comment,
            now,
        );
        tx.insert_note(note.clone())?;
        tx.commit();

        info!(delivery = %delivery_slug, rating, "delivery rated");
        Ok(note)
    }

    // ---- reads -------------------------------------------------------

    pub async fn get(&self, actor: &Actor, delivery_slug: &Slug) -> CoreResult<Delivery> {
        let delivery = self.store.delivery(delivery_slug).await?;
        match actor.role {
            Role::Admin | Role::Moderator => Ok(delivery),
            Role::Delivery if delivery.courier == actor.slug => Ok(delivery),
            Role::Customer => {
                let order = self.store.order(&delivery.order).await?;
                if order.customer == actor.slug {
                    Ok(delivery)
                } else {
                    Err(CoreError::Forbidden(
                        "this delivery belongs to another customer".to_string(),
                    ))
                }
            }
            _ => Err(CoreError::Forbidden(
                "this delivery is not visible for your role".to_string(),
            )),
        }
    }

    pub async fn list(&self, actor: &Actor) -> CoreResult<Vec<Delivery>> {
        match actor.role {
            Role::Admin | Role::Moderator => Ok(self.store.deliveries().await),
            Role::Delivery => Ok(self.store.deliveries_for_courier(&actor.slug).await),
            _ => Err(CoreError::Forbidden(
                "this listing is not available for your role".to_string(),
            )),
        }
    }

    pub async fn notes(&self, actor: &Actor, delivery_slug: &Slug) -> CoreResult<Vec<DeliveryNote>> {
        // Notes are visible to whoever may see the delivery itself.
        self.get(actor, delivery_slug).await?;
        Ok(self.store.notes_for_delivery(delivery_slug).await)
    }

    async fn notify(&self, recipient: Slug, title: &str, body: String, delivery: &Slug) {
        let notification = Notification::new(
            recipient,
            title,
            body,
            Some(("delivery", delivery.clone())),
            self.clock.now(),
        );
        self.sink.notify(notification).await;
    }
}
