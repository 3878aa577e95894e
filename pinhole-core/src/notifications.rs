use crate::{
    error::{Result, ServiceError},
    graph::summaries_by_id,
};
use pinhole_common::{
    model::{
        notification::{Notification, NotificationId},
        user::{UserId, UserSummary},
    },
    pagination::{Page, PageRequest},
};
use pinhole_db::SharedStore;
use serde::Serialize;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub from: Option<UserSummary>,
}

/// The recipient side of notifications. Writing them is the job of
/// [`NotificationFanout`](crate::hooks::NotificationFanout).
#[derive(Clone)]
pub struct NotificationService {
    store: SharedStore,
}

impl NotificationService {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        recipient: UserId,
        request: PageRequest,
    ) -> Result<Page<NotificationView>> {
        let total = self.store.count_notifications(recipient).await?;
        let notifications = self
            .store
            .fetch_notifications(recipient, request.window())
            .await?;

        let mut actor_ids: Vec<UserId> = notifications
            .iter()
            .map(|notification| notification.actor)
            .collect();
        actor_ids.sort_unstable();
        actor_ids.dedup();
        let actors = summaries_by_id(&self.store, &actor_ids).await?;

        let views = notifications
            .into_iter()
            .map(|notification| NotificationView {
                from: actors.get(&notification.actor).cloned(),
                notification,
            })
            .collect();
        Ok(Page::new(views, request, total))
    }

    pub async fn mark_read(&self, actor: UserId, notification_id: NotificationId) -> Result<()> {
        self.owned(actor, notification_id).await?;
        self.store.mark_notification_read(notification_id).await?;
        Ok(())
    }

    /// Returns how many notifications changed from unread to read.
    pub async fn mark_all_read(&self, actor: UserId) -> Result<u64> {
        Ok(self.store.mark_all_notifications_read(actor).await?)
    }

    pub async fn delete(&self, actor: UserId, notification_id: NotificationId) -> Result<()> {
        self.owned(actor, notification_id).await?;
        if self.store.delete_notification(notification_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Notification"))
        }
    }

    async fn owned(&self, actor: UserId, notification_id: NotificationId) -> Result<Notification> {
        let notification = self
            .store
            .fetch_notification(notification_id)
            .await?
            .ok_or(ServiceError::NotFound("Notification"))?;
        if notification.recipient != actor {
            return Err(ServiceError::Forbidden("Not authorized"));
        }
        Ok(notification)
    }
}
