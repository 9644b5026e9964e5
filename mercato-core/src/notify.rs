use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercato_shared::Slug;

/// A message raised by a state transition for one recipient.
///
/// `related_kind`/`related_slug` let a client deep-link to the object the
/// transition touched ("order", "delivery", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub slug: Slug,
    pub recipient: Slug,
    pub title: String,
    pub body: String,
    pub related_kind: Option<String>,
    pub related_slug: Option<Slug>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: Slug,
        title: impl Into<String>,
        body: impl Into<String>,
        related: Option<(&str, Slug)>,
        now: DateTime<Utc>,
    ) -> Self {
        let (related_kind, related_slug) = match related {
            Some((kind, slug)) => (Some(kind.to_string()), Some(slug)),
            None => (None, None),
        };
        Self {
            slug: Slug::new("ntf"),
            recipient,
            title: title.into(),
            body: body.into(),
            related_kind,
            related_slug,
            is_read: false,
            created_at: now,
        }
    }
}

/// Fire-and-forget dispatch raised on state transitions.
///
/// Implementations deliver best-effort and swallow their own failures; a
/// broken sink must never fail or block the transition that raised the
/// notification, so the method has no error channel at all.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Sink that only writes to the log. Default for tests and headless tools.
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn notify(&self, notification: Notification) {
        tracing::info!(
            recipient = %notification.recipient,
            title = %notification.title,
            "notification dispatched"
        );
    }
}
