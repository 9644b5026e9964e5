use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Order, OrderItem, OrderStatus, Payment};
use crate::store::MarketStore;
use mercato_catalog::SnapshotProvider;
use mercato_core::{Actor, Clock, CoreError, CoreResult, Notification, NotificationSink, Role};
use mercato_shared::Slug;
use mercato_store::app_config::RefundPolicy;

/// One (product, quantity) pair requested at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: Slug,
    pub quantity: u32,
}

/// Application services for the order lifecycle.
///
/// One function per transition. Each resolves its inputs, opens one store
/// transaction for every check and mutation, and raises notifications only
/// after the transaction committed.
pub struct OrderService {
    store: Arc<MarketStore>,
    snapshots: SnapshotProvider,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    refund_policy: RefundPolicy,
}

impl OrderService {
    pub fn new(
        store: Arc<MarketStore>,
        snapshots: SnapshotProvider,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        refund_policy: RefundPolicy,
    ) -> Self {
        Self {
            store,
            snapshots,
            sink,
            clock,
            refund_policy,
        }
    }

    /// Checkout: capture a price snapshot per line and create the order in
    /// `pending`. One unresolvable line fails the whole operation before
    /// anything is persisted.
    pub async fn create_order(
        &self,
        actor: &Actor,
        supermarket: Slug,
        lines: Vec<OrderLine>,
    ) -> CoreResult<Order> {
        actor.require_role(Role::Customer, "place an order")?;
        if lines.is_empty() {
            return Err(CoreError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut order = Order::new(actor.slug.clone(), supermarket.clone(), now);
        for line in &lines {
            let snapshot = self
                .snapshots
                .quote(&supermarket, &line.product, line.quantity)
                .await?;
            let item = OrderItem::from_snapshot(&order.slug, snapshot, now);
            order.add_item(item, now);
        }

        let mut tx = self.store.begin().await;
        tx.insert_order(order.clone());
        tx.commit();

        info!(order = %order.slug, total_cents = order.total_cents, "order created");
        self.notify(
            order.customer.clone(),
            "Order placed",
            format!(
                "Your order {} with {} item(s) was placed",
                order.slug,
                order.items.len()
            ),
            &order.slug,
        )
        .await;
        Ok(order)
    }

    /// Record the payment and move the order to `paid` in one transaction.
    pub async fn pay_order(
        &self,
        actor: &Actor,
        order_slug: &Slug,
        method: &str,
        transaction_id: &str,
    ) -> CoreResult<Order> {
        actor.require_role(Role::Customer, "pay an order")?;
        if transaction_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "a transaction id is required".to_string(),
            ));
        }
        if method.trim().is_empty() {
            return Err(CoreError::Validation(
                "a payment method is required".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let order = tx.order(order_slug)?;
        if order.customer != actor.slug {
            return Err(CoreError::Forbidden(
                "only the order's customer may pay it".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(CoreError::invalid_state("pay", order.status.as_str()));
        }
        let amount_cents = order.total_cents;

        if !tx.claim_transaction_id(transaction_id) {
            return Err(CoreError::AlreadyExists(format!(
                "transaction id {transaction_id} was already recorded"
            )));
        }

        let payment = Payment {
            slug: Slug::new("pay"),
            order: order_slug.clone(),
            method: method.to_string(),
            amount_cents,
            transaction_id: transaction_id.to_string(),
            paid_at: now,
        };
        let order = tx.order_mut(order_slug)?;
        order.record_payment(payment, now);
        let updated = order.clone();
        tx.commit();

        info!(order = %order_slug, amount_cents, "order paid");
        self.notify(
            updated.customer.clone(),
            "Payment received",
            format!("Payment for order {order_slug} was recorded"),
            order_slug,
        )
        .await;
        Ok(updated)
    }

    /// Reverse a payment: delete the record, release its transaction id and
    /// return the order to `pending`, all in one transaction.
    pub async fn revoke_payment(&self, actor: &Actor, order_slug: &Slug) -> CoreResult<Order> {
        actor.require_any(&[Role::Admin, Role::Moderator], "revoke a payment")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let order = tx.order(order_slug)?;
        let Some(payment) = order.payment.as_ref() else {
            return Err(CoreError::not_found(format!(
                "payment for order {order_slug}"
            )));
        };
        let transaction_id = payment.transaction_id.clone();

        tx.release_transaction_id(&transaction_id);
        let order = tx.order_mut(order_slug)?;
        order.revoke_payment(now);
        let updated = order.clone();
        tx.commit();

        info!(order = %order_slug, transaction_id, "payment revoked");
        self.notify(
            updated.customer.clone(),
            "Payment reversed",
            format!("The payment for order {order_slug} was reversed"),
            order_slug,
        )
        .await;
        Ok(updated)
    }

    /// Customer cancellation, allowed only while the order is `pending`.
    /// Once paid, cancellation goes through the delivery workflow.
    pub async fn cancel_order(&self, actor: &Actor, order_slug: &Slug) -> CoreResult<Order> {
        actor.require_role(Role::Customer, "cancel an order")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let order = tx.order(order_slug)?;
        if order.customer != actor.slug {
            return Err(CoreError::Forbidden(
                "only the order's customer may cancel it".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(CoreError::invalid_state("cancel", order.status.as_str()));
        }

        let order = tx.order_mut(order_slug)?;
        order.mark_canceled(now);
        let updated = order.clone();
        tx.commit();

        info!(order = %order_slug, "order canceled");
        self.notify(
            updated.customer.clone(),
            "Order canceled",
            format!("Your order {order_slug} was canceled"),
            order_slug,
        )
        .await;
        Ok(updated)
    }

    /// Administrative refund, governed by the configured policy.
    pub async fn refund_order(&self, actor: &Actor, order_slug: &Slug) -> CoreResult<Order> {
        actor.require_role(Role::Admin, "refund an order")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;

        let order = tx.order(order_slug)?;
        if self.refund_policy == RefundPolicy::RequirePaid
            && (!order.is_paid || order.is_refunded)
        {
            return Err(CoreError::invalid_state("refund", order.status.as_str()));
        }

        let order = tx.order_mut(order_slug)?;
        order.mark_refunded(now);
        let updated = order.clone();
        tx.commit();

        info!(order = %order_slug, "order refunded");
        self.notify(
            updated.customer.clone(),
            "Order refunded",
            format!("Your order {order_slug} was refunded"),
            order_slug,
        )
        .await;
        Ok(updated)
    }

    /// Soft-remove the order record. Subsequent reads and transitions see
    /// `NotFound`; the row itself stays.
    pub async fn remove_order(&self, actor: &Actor, order_slug: &Slug) -> CoreResult<()> {
        actor.require_role(Role::Admin, "remove an order")?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;
        let order = tx.order_mut(order_slug)?;
        order.soft_remove(now);
        tx.commit();

        info!(order = %order_slug, "order removed");
        Ok(())
    }

    // ---- reads -------------------------------------------------------

    pub async fn get_order(&self, actor: &Actor, order_slug: &Slug) -> CoreResult<Order> {
        let order = self.store.order(order_slug).await?;
        match actor.role {
            Role::Admin | Role::Moderator => Ok(order),
            Role::Customer if order.customer == actor.slug => Ok(order),
            _ => Err(CoreError::Forbidden(
                "this order belongs to another customer".to_string(),
            )),
        }
    }

    pub async fn list_orders(&self, actor: &Actor) -> CoreResult<Vec<Order>> {
        match actor.role {
            Role::Admin | Role::Moderator => Ok(self.store.orders().await),
            Role::Customer => Ok(self.store.orders_for_customer(&actor.slug).await),
            _ => Err(CoreError::Forbidden(
                "this listing is not available for your role".to_string(),
            )),
        }
    }

    async fn notify(&self, recipient: Slug, title: &str, body: String, order: &Slug) {
        let notification = Notification::new(
            recipient,
            title,
            body,
            Some(("order", order.clone())),
            self.clock.now(),
        );
        self.sink.notify(notification).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_catalog::ProductRecord;
    use mercato_core::clock::SystemClock;
    use mercato_core::notify::LoggingSink;
    use mercato_store::{InMemoryProductCatalog, NotificationHub};

    fn customer() -> Actor {
        Actor::new(Slug::from_raw("usr-cust"), Role::Customer)
    }

    fn other_customer() -> Actor {
        Actor::new(Slug::from_raw("usr-other"), Role::Customer)
    }

    fn admin() -> Actor {
        Actor::new(Slug::from_raw("usr-admin"), Role::Admin)
    }

    fn moderator() -> Actor {
        Actor::new(Slug::from_raw("usr-mod"), Role::Moderator)
    }

    fn market() -> Slug {
        Slug::from_raw("mkt-1")
    }

    async fn seeded_catalog() -> Arc<InMemoryProductCatalog> {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        for (slug, price_cents) in [("prd-oil", 1000), ("prd-sugar", 500), ("prd-soap", 200)] {
            catalog
                .insert(ProductRecord {
                    slug: Slug::from_raw(slug),
                    supermarket: market(),
                    name: slug.to_string(),
                    description: None,
                    price_cents,
                    stock: 50,
                    is_active: true,
                })
                .await;
        }
        catalog
    }

    async fn harness(policy: RefundPolicy) -> (OrderService, Arc<MarketStore>) {
        let store = Arc::new(MarketStore::new());
        let service = OrderService::new(
            store.clone(),
            SnapshotProvider::new(seeded_catalog().await),
            Arc::new(LoggingSink),
            Arc::new(SystemClock),
            policy,
        );
        (service, store)
    }

    fn standard_lines() -> Vec<OrderLine> {
        vec![
            OrderLine {
                product: Slug::from_raw("prd-oil"),
                quantity: 2,
            },
            OrderLine {
                product: Slug::from_raw("prd-sugar"),
                quantity: 1,
            },
            OrderLine {
                product: Slug::from_raw("prd-soap"),
                quantity: 3,
            },
        ]
    }

    #[tokio::test]
    async fn checkout_captures_prices_and_totals() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let order = service
            .create_order(&customer(), market(), standard_lines())
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 3);
        // 2×1000 + 1×500 + 3×200
        assert_eq!(order.total_cents, 3100);
    }

    #[tokio::test]
    async fn empty_checkout_is_rejected() {
        let (service, store) = harness(RefundPolicy::RequirePaid).await;
        let err = service
            .create_order(&customer(), market(), vec![])
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.orders().await.is_empty());
    }

    #[tokio::test]
    async fn one_bad_product_fails_the_whole_checkout() {
        let (service, store) = harness(RefundPolicy::RequirePaid).await;
        let mut lines = standard_lines();
        lines.push(OrderLine {
            product: Slug::from_raw("prd-ghost"),
            quantity: 1,
        });

        let err = service
            .create_order(&customer(), market(), lines)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
        // Nothing persisted, not even the resolvable lines.
        assert!(store.orders().await.is_empty());
    }

    #[tokio::test]
    async fn pay_cancel_revoke_walkthrough() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        let paid = service
            .pay_order(&actor, &order.slug, "mobile_money", "tx-1")
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.is_paid);
        let payment = paid.payment.as_ref().unwrap();
        assert_eq!(payment.amount_cents, 3100);
        assert_eq!(payment.transaction_id, "tx-1");

        // Once paid, the customer can no longer cancel directly.
        let err = service.cancel_order(&actor, &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));

        // Revoking returns the order to exactly its pre-payment state.
        let reverted = service
            .revoke_payment(&admin(), &order.slug)
            .await
            .unwrap();
        assert_eq!(reverted.status, OrderStatus::Pending);
        assert!(!reverted.is_paid);
        assert!(reverted.payment.is_none());

        // The deleted payment released its transaction id.
        let repaid = service
            .pay_order(&actor, &order.slug, "mobile_money", "tx-1")
            .await
            .unwrap();
        assert_eq!(repaid.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn pay_rejects_wrong_state_owner_and_input() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        let err = service
            .pay_order(&other_customer(), &order.slug, "card", "tx-a")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = service
            .pay_order(&actor, &order.slug, "card", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        service
            .pay_order(&actor, &order.slug, "card", "tx-a")
            .await
            .unwrap();
        let err = service
            .pay_order(&actor, &order.slug, "card", "tx-b")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn transaction_ids_are_unique_across_orders() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let first = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();
        let second = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        service
            .pay_order(&actor, &first.slug, "card", "tx-dup")
            .await
            .unwrap();
        let err = service
            .pay_order(&actor, &second.slug, "card", "tx-dup")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn concurrent_pay_has_exactly_one_winner() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            service.pay_order(&actor, &order.slug, "card", "tx-a"),
            service.pay_order(&actor, &order.slug, "card", "tx-b"),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(
            failure,
            CoreError::InvalidState { .. } | CoreError::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn cancel_marks_pending_orders_only() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        let canceled = service.cancel_order(&actor, &order.slug).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert!(canceled.is_canceled);
        assert!(canceled.canceled_at.is_some());

        let err = service.cancel_order(&actor, &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn refund_demands_a_payment_by_default() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        let err = service.refund_order(&admin(), &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));

        service
            .pay_order(&actor, &order.slug, "card", "tx-1")
            .await
            .unwrap();
        let refunded = service.refund_order(&admin(), &order.slug).await.unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);
        assert!(refunded.is_refunded);

        // And only once.
        let err = service.refund_order(&admin(), &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn unrestricted_refund_keeps_the_legacy_behavior() {
        let (service, _) = harness(RefundPolicy::Unrestricted).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        // No payment was ever recorded; the bare administrative action
        // still goes through under this policy.
        let refunded = service.refund_order(&admin(), &order.slug).await.unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);
    }

    #[tokio::test]
    async fn refund_and_revoke_are_role_gated() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();
        service
            .pay_order(&actor, &order.slug, "card", "tx-1")
            .await
            .unwrap();

        let err = service.refund_order(&moderator(), &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = service.revoke_payment(&actor, &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        // Moderators may revoke, customers may not.
        service.revoke_payment(&moderator(), &order.slug).await.unwrap();
    }

    #[tokio::test]
    async fn revoke_without_payment_is_not_found() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let order = service
            .create_order(&customer(), market(), standard_lines())
            .await
            .unwrap();

        let err = service.revoke_payment(&admin(), &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn removed_orders_vanish_from_reads_and_transitions() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        service.remove_order(&admin(), &order.slug).await.unwrap();

        let err = service.get_order(&actor, &order.slug).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let err = service
            .pay_order(&actor, &order.slug, "card", "tx-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn visibility_follows_roles() {
        let (service, _) = harness(RefundPolicy::RequirePaid).await;
        let actor = customer();
        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();

        assert!(service.get_order(&actor, &order.slug).await.is_ok());
        assert!(service.get_order(&moderator(), &order.slug).await.is_ok());
        let err = service
            .get_order(&other_customer(), &order.slug)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        assert_eq!(service.list_orders(&actor).await.unwrap().len(), 1);
        assert!(service
            .list_orders(&other_customer())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(service.list_orders(&admin()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn captured_prices_survive_live_catalog_changes() {
        let store = Arc::new(MarketStore::new());
        let catalog = seeded_catalog().await;
        let service = OrderService::new(
            store,
            SnapshotProvider::new(catalog.clone()),
            Arc::new(LoggingSink),
            Arc::new(SystemClock),
            RefundPolicy::RequirePaid,
        );
        let actor = customer();

        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();
        assert_eq!(order.total_cents, 3100);

        // The live catalog moves; the captured snapshot does not.
        catalog
            .set_price(&Slug::from_raw("prd-oil"), 9999)
            .await
            .unwrap();

        let paid = service
            .pay_order(&actor, &order.slug, "card", "tx-1")
            .await
            .unwrap();
        assert_eq!(paid.payment.unwrap().amount_cents, 3100);

        let mut fetched = service.get_order(&actor, &order.slug).await.unwrap();
        assert_eq!(fetched.recalculate_total(), 3100);
    }

    #[tokio::test]
    async fn timestamps_come_from_the_injected_clock() {
        use mercato_core::clock::FixedClock;

        let instant = chrono::DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let service = OrderService::new(
            Arc::new(MarketStore::new()),
            SnapshotProvider::new(seeded_catalog().await),
            Arc::new(LoggingSink),
            Arc::new(FixedClock(instant)),
            RefundPolicy::RequirePaid,
        );
        let actor = customer();

        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();
        assert_eq!(order.lifecycle.created_at, instant);

        let paid = service
            .pay_order(&actor, &order.slug, "card", "tx-1")
            .await
            .unwrap();
        assert_eq!(paid.paid_at, Some(instant));
        assert_eq!(paid.payment.unwrap().paid_at, instant);
    }

    #[tokio::test]
    async fn transitions_raise_notifications() {
        let store = Arc::new(MarketStore::new());
        let hub = Arc::new(NotificationHub::new(16));
        let service = OrderService::new(
            store,
            SnapshotProvider::new(seeded_catalog().await),
            hub.clone(),
            Arc::new(SystemClock),
            RefundPolicy::RequirePaid,
        );
        let actor = customer();

        let order = service
            .create_order(&actor, market(), standard_lines())
            .await
            .unwrap();
        service
            .pay_order(&actor, &order.slug, "card", "tx-1")
            .await
            .unwrap();

        let inbox = hub.inbox_for(&actor.slug).await;
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[1].title, "Payment received");
        assert_eq!(inbox[1].related_slug.as_ref(), Some(&order.slug));
    }
}
