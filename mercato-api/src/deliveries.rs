use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use mercato_core::{Actor, Role, UserRecord};
use mercato_order::{Delivery, DeliveryNote, DeliveryStatus};
use mercato_shared::{GeoPoint, Slug};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AssignDeliveryRequest {
    pub order: Slug,
    pub courier: Slug,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub slug: Slug,
    pub order: Slug,
    pub courier: Slug,
    pub status: DeliveryStatus,
    pub pickup_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub address: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryNoteResponse {
    pub slug: Slug,
    pub delivery: Slug,
    pub rating: u8,
    pub comment: String,
    pub author: Slug,
    pub created_at: DateTime<Utc>,
}

impl From<Delivery> for DeliveryResponse {
    fn from(delivery: Delivery) -> Self {
        Self {
            slug: delivery.slug,
            order: delivery.order,
            courier: delivery.courier,
            status: delivery.status,
            pickup_time: delivery.pickup_time,
            delivery_time: delivery.delivery_time,
            address: delivery.address,
            created_at: delivery.lifecycle.created_at,
            updated_at: delivery.lifecycle.updated_at,
        }
    }
}

impl From<DeliveryNote> for DeliveryNoteResponse {
    fn from(note: DeliveryNote) -> Self {
        Self {
            slug: note.slug,
            delivery: note.delivery,
            rating: note.rating,
            comment: note.comment,
            author: note.author,
            created_at: note.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/deliveries
/// Assign a courier to an order
pub async fn assign_delivery(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<AssignDeliveryRequest>,
) -> Result<(StatusCode, Json<DeliveryResponse>), AppError> {
    let delivery = state
        .deliveries
        .assign(
            &actor,
            &req.order,
            &req.courier,
            GeoPoint::new(req.longitude, req.latitude),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(delivery.into())))
}

/// GET /v1/deliveries
/// List deliveries visible to the caller
pub async fn list_deliveries(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<DeliveryResponse>>, AppError> {
    let deliveries = state.deliveries.list(&actor).await?;
    Ok(Json(deliveries.into_iter().map(Into::into).collect()))
}

/// GET /v1/deliveries/{slug}
pub async fn get_delivery(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let delivery = state
        .deliveries
        .get(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(delivery.into()))
}

/// POST /v1/deliveries/{slug}/pickup
pub async fn pick_up_delivery(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let delivery = state
        .deliveries
        .pick_up(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(delivery.into()))
}

/// POST /v1/deliveries/{slug}/deliver
pub async fn complete_delivery(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let delivery = state
        .deliveries
        .deliver(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(delivery.into()))
}

/// POST /v1/deliveries/{slug}/cancel
pub async fn cancel_delivery(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let delivery = state
        .deliveries
        .cancel(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(delivery.into()))
}

/// POST /v1/deliveries/{slug}/notes
/// Rate a delivery
pub async fn create_note(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<DeliveryNoteResponse>), AppError> {
    let note = state
        .deliveries
        .add_note(&actor, &Slug::from_raw(slug), req.rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

/// GET /v1/couriers
/// Couriers available for assignment
pub async fn list_couriers(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    actor.require_any(&[Role::Admin, Role::Moderator], "list couriers")?;
    Ok(Json(state.directory.find_by_role(Role::Delivery).await))
}

/// GET /v1/deliveries/{slug}/notes
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<DeliveryNoteResponse>>, AppError> {
    let notes = state
        .deliveries
        .notes(&actor, &Slug::from_raw(slug))
        .await?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}
