use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::error::AppError;
use crate::state::AppState;
use mercato_core::{Actor, Notification};
use mercato_shared::Slug;

/// GET /v1/notifications
/// The caller's inbox, oldest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Json<Vec<Notification>> {
    Json(state.hub.inbox_for(&actor.slug).await)
}

/// POST /v1/notifications/{slug}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .hub
        .mark_read(&actor.slug, &Slug::from_raw(slug))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/notifications/stream
/// Live notifications for the caller, as server-sent events
pub async fn stream_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let recipient = actor.slug.clone();
    let stream = BroadcastStream::new(state.hub.subscribe()).filter_map(move |result| {
        let recipient = recipient.clone();
        async move {
            match result {
                Ok(notification) if notification.recipient == recipient => Event::default()
                    .event("notification")
                    .json_data(&notification)
                    .ok()
                    .map(Ok::<_, Infallible>),
                // Other recipients' events and lagged-receiver errors are
                // skipped, not surfaced.
                _ => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
