use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod deliveries;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod orders;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let protected = Router::new()
        .route(
            "/v1/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route(
            "/v1/orders/{slug}",
            get(orders::get_order).delete(orders::remove_order),
        )
        .route("/v1/orders/{slug}/pay", post(orders::pay_order))
        .route(
            "/v1/orders/{slug}/revoke-payment",
            post(orders::revoke_payment),
        )
        .route("/v1/orders/{slug}/cancel", post(orders::cancel_order))
        .route("/v1/orders/{slug}/refund", post(orders::refund_order))
        .route(
            "/v1/deliveries",
            post(deliveries::assign_delivery).get(deliveries::list_deliveries),
        )
        .route("/v1/deliveries/{slug}", get(deliveries::get_delivery))
        .route(
            "/v1/deliveries/{slug}/pickup",
            post(deliveries::pick_up_delivery),
        )
        .route(
            "/v1/deliveries/{slug}/deliver",
            post(deliveries::complete_delivery),
        )
        .route(
            "/v1/deliveries/{slug}/cancel",
            post(deliveries::cancel_delivery),
        )
        .route(
            "/v1/deliveries/{slug}/notes",
            post(deliveries::create_note).get(deliveries::list_notes),
        )
        .route("/v1/couriers", get(deliveries::list_couriers))
        .route(
            "/v1/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/v1/notifications/{slug}/read",
            post(notifications::mark_read),
        )
        .route(
            "/v1/notifications/stream",
            get(notifications::stream_notifications),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
