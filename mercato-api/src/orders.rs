use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use mercato_core::Actor;
use mercato_order::{Order, OrderItem, OrderLine, OrderStatus, Payment};
use mercato_shared::Slug;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub supermarket: Slug,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Deserialize)]
pub struct PayOrderRequest {
    pub payment_method: String,
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub slug: Slug,
    pub customer: Slug,
    pub supermarket: Slug,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_items: usize,
    pub total_cents: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub is_canceled: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub is_refunded: bool,
    pub refunded_at: Option<DateTime<Utc>>,
    pub payment: Option<PaymentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub slug: Slug,
    pub product: Slug,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub slug: Slug,
    pub method: String,
    pub amount_cents: i64,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            slug: item.slug,
            product: item.product,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            line_total_cents: item.line_total_cents,
        }
    }
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            slug: payment.slug,
            method: payment.method,
            amount_cents: payment.amount_cents,
            transaction_id: payment.transaction_id,
            paid_at: payment.paid_at,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            slug: order.slug,
            customer: order.customer,
            supermarket: order.supermarket,
            status: order.status,
            total_items: order.items.len(),
            items: order.items.into_iter().map(Into::into).collect(),
            total_cents: order.total_cents,
            is_paid: order.is_paid,
            paid_at: order.paid_at,
            is_delivered: order.is_delivered,
            delivered_at: order.delivered_at,
            is_canceled: order.is_canceled,
            canceled_at: order.canceled_at,
            is_refunded: order.is_refunded,
            refunded_at: order.refunded_at,
            payment: order.payment.map(Into::into),
            created_at: order.lifecycle.created_at,
            updated_at: order.lifecycle.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Checkout: place an order against one supermarket
pub async fn create_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state
        .orders
        .create_order(&actor, req.supermarket, req.items)
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /v1/orders
/// List orders visible to the caller
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.orders.list_orders(&actor).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /v1/orders/{slug}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .get_order(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(order.into()))
}

/// POST /v1/orders/{slug}/pay
pub async fn pay_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
    Json(req): Json<PayOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .pay_order(
            &actor,
            &Slug::from_raw(slug),
            &req.payment_method,
            &req.transaction_id,
        )
        .await?;
    Ok(Json(order.into()))
}

/// POST /v1/orders/{slug}/revoke-payment
pub async fn revoke_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .revoke_payment(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(order.into()))
}

/// POST /v1/orders/{slug}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .cancel_order(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(order.into()))
}

/// POST /v1/orders/{slug}/refund
pub async fn refund_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .refund_order(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /v1/orders/{slug}
/// Soft-remove an order record
pub async fn remove_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .orders
        .remove_order(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
