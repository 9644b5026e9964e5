use std::sync::Arc;

use mercato_core::UserDirectory;
use mercato_order::{DeliveryService, OrderService};
use mercato_store::NotificationHub;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub deliveries: Arc<DeliveryService>,
    pub directory: Arc<dyn UserDirectory>,
    pub hub: Arc<NotificationHub>,
    pub auth: AuthConfig,
}
