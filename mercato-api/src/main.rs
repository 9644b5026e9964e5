use std::net::SocketAddr;
use std::sync::Arc;

use mercato_api::{app, AppState, AuthConfig};
use mercato_catalog::{ProductRecord, SnapshotProvider};
use mercato_core::{Role, SystemClock, UserRecord};
use mercato_order::{DeliveryService, MarketStore, OrderService};
use mercato_shared::Slug;
use mercato_store::{
    app_config::Config, InMemoryProductCatalog, InMemoryUserDirectory, NotificationHub,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mercato_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Mercato API on port {}", config.server.port);

    let store = Arc::new(MarketStore::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let hub = Arc::new(NotificationHub::new(config.notifications.channel_capacity));
    let clock = Arc::new(SystemClock);

    if config.server.seed_demo_data {
        seed_demo_data(&directory, &catalog).await;
    }

    let orders = Arc::new(OrderService::new(
        store.clone(),
        SnapshotProvider::new(catalog.clone()),
        hub.clone(),
        clock.clone(),
        config.orders.refund_policy,
    ));
    let deliveries = Arc::new(DeliveryService::new(
        store.clone(),
        directory.clone(),
        hub.clone(),
        clock,
    ));

    let app_state = AppState {
        orders,
        deliveries,
        directory,
        hub,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Development fixture: one user per role and a small catalog, so the API
/// is drivable right after boot. Controlled by `server.seed_demo_data`.
async fn seed_demo_data(directory: &InMemoryUserDirectory, catalog: &InMemoryProductCatalog) {
    let users = [
        ("usr-admin", "Ada", Role::Admin),
        ("usr-mod", "Moussa", Role::Moderator),
        ("usr-seller", "Fatou", Role::Seller),
        ("usr-cust", "Khadija", Role::Customer),
        ("usr-courier", "Ibrahima", Role::Delivery),
    ];
    for (slug, firstname, role) in users {
        directory
            .insert(UserRecord {
                slug: Slug::from_raw(slug),
                firstname: firstname.to_string(),
                lastname: "Demo".to_string(),
                email: format!("{slug}@mercato.test"),
                role,
                is_blocked: false,
            })
            .await;
        tracing::info!(user = slug, role = %role, "seeded demo user");
    }

    let products = [
        ("prd-rice", "Rice 5kg", 4500_i64),
        ("prd-oil", "Sunflower oil 1L", 1800),
        ("prd-soap", "Laundry soap", 350),
    ];
    for (slug, name, price_cents) in products {
        catalog
            .insert(ProductRecord {
                slug: Slug::from_raw(slug),
                supermarket: Slug::from_raw("mkt-demo"),
                name: name.to_string(),
                description: None,
                price_cents,
                stock: 100,
                is_active: true,
            })
            .await;
        tracing::info!(product = slug, price_cents, "seeded demo product");
    }
}
