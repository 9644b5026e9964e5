use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use mercato_core::{CoreError, CoreResult, Notification, NotificationSink};
use mercato_shared::Slug;

/// In-process notification fan-out: a per-user inbox plus a broadcast
/// channel for live subscribers (the API's SSE stream).
///
/// Dispatch is best-effort. A full or subscriber-less channel is logged and
/// ignored; the transition that raised the notification never sees it.
pub struct NotificationHub {
    inbox: RwLock<HashMap<Slug, Vec<Notification>>>,
    tx: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity);
        Self {
            inbox: RwLock::new(HashMap::new()),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Everything dispatched to one user, oldest first.
    pub async fn inbox_for(&self, user: &Slug) -> Vec<Notification> {
        self.inbox
            .read()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn mark_read(&self, user: &Slug, notification: &Slug) -> CoreResult<()> {
        let mut inbox = self.inbox.write().await;
        let entries = inbox
            .get_mut(user)
            .ok_or_else(|| CoreError::not_found(format!("notification {notification}")))?;
        let entry = entries
            .iter_mut()
            .find(|n| &n.slug == notification)
            .ok_or_else(|| CoreError::not_found(format!("notification {notification}")))?;
        entry.is_read = true;
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for NotificationHub {
    async fn notify(&self, notification: Notification) {
        info!(
            recipient = %notification.recipient,
            title = %notification.title,
            "notification dispatched"
        );

        self.inbox
            .write()
            .await
            .entry(notification.recipient.clone())
            .or_default()
            .push(notification.clone());

        // send only errors when nobody is subscribed; that is not a failure.
        let _ = self.tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(recipient: &str, title: &str) -> Notification {
        Notification::new(
            Slug::from_raw(recipient),
            title,
            "body",
            Some(("order", Slug::from_raw("ord-1"))),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn inbox_collects_per_recipient() {
        let hub = NotificationHub::new(8);
        hub.notify(notification("usr-a", "first")).await;
        hub.notify(notification("usr-a", "second")).await;
        hub.notify(notification("usr-b", "other")).await;

        let inbox = hub.inbox_for(&Slug::from_raw("usr-a")).await;
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|n| !n.is_read));
        assert_eq!(hub.inbox_for(&Slug::from_raw("usr-b")).await.len(), 1);
    }

    #[tokio::test]
    async fn mark_read_flips_one_entry() {
        let hub = NotificationHub::new(8);
        hub.notify(notification("usr-a", "first")).await;
        let slug = hub.inbox_for(&Slug::from_raw("usr-a")).await[0].slug.clone();

        hub.mark_read(&Slug::from_raw("usr-a"), &slug).await.unwrap();
        assert!(hub.inbox_for(&Slug::from_raw("usr-a")).await[0].is_read);

        let missing = hub
            .mark_read(&Slug::from_raw("usr-a"), &Slug::from_raw("ntf-x"))
            .await;
        assert!(matches!(missing, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn dispatch_without_subscribers_is_not_an_error() {
        // No receiver exists; notify must still complete and fill the inbox.
        let hub = NotificationHub::new(1);
        hub.notify(notification("usr-a", "first")).await;
        assert_eq!(hub.inbox_for(&Slug::from_raw("usr-a")).await.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_live_events() {
        let hub = NotificationHub::new(8);
        let mut rx = hub.subscribe();
        hub.notify(notification("usr-a", "live")).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "live");
    }
}
