//! Side effects that run after a social action has been committed.
//!
//! Hooks observe [`SocialEvent`]s. A failing hook is logged and skipped: it
//! can neither undo the action nor fail the request that caused it.

use crate::error::Result;
use async_trait::async_trait;
use pinhole_common::model::{
    comment::CommentId,
    message::MessageId,
    notification::{CreateNotification, NotificationKind},
    post::PostId,
    story::StoryId,
    user::{User, UserId},
};
use pinhole_db::SharedStore;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SocialEvent {
    Followed {
        follower: UserId,
        followee: UserId,
    },
    PostLiked {
        actor: UserId,
        post: PostId,
        creator: UserId,
    },
    PostCommented {
        actor: UserId,
        post: PostId,
        creator: UserId,
        comment: CommentId,
    },
    PostSaved {
        actor: UserId,
        post: PostId,
        creator: UserId,
    },
    PostCreated {
        actor: UserId,
        post: PostId,
    },
    StoryCreated {
        actor: UserId,
        story: StoryId,
    },
    StoryViewed {
        viewer: UserId,
        story: StoryId,
        creator: UserId,
    },
    MessageSent {
        sender: UserId,
        receiver: UserId,
        message: MessageId,
    },
}

impl SocialEvent {
    #[must_use]
    pub fn actor(&self) -> UserId {
        match *self {
            SocialEvent::Followed { follower, .. } => follower,
            SocialEvent::StoryViewed { viewer, .. } => viewer,
            SocialEvent::MessageSent { sender, .. } => sender,
            SocialEvent::PostLiked { actor, .. }
            | SocialEvent::PostCommented { actor, .. }
            | SocialEvent::PostSaved { actor, .. }
            | SocialEvent::PostCreated { actor, .. }
            | SocialEvent::StoryCreated { actor, .. } => actor,
        }
    }

    #[must_use]
    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            SocialEvent::Followed { .. } => NotificationKind::Follow,
            SocialEvent::PostLiked { .. } => NotificationKind::Like,
            SocialEvent::PostCommented { .. } => NotificationKind::Comment,
            SocialEvent::PostSaved { .. } => NotificationKind::Save,
            SocialEvent::PostCreated { .. } => NotificationKind::Post,
            SocialEvent::StoryCreated { .. } => NotificationKind::Story,
            SocialEvent::StoryViewed { .. } => NotificationKind::StoryView,
            SocialEvent::MessageSent { .. } => NotificationKind::Message,
        }
    }

    /// The recipient of a single-recipient event. `None` for events that go
    /// out to the actor's followers.
    #[must_use]
    pub fn direct_recipient(&self) -> Option<UserId> {
        match *self {
            SocialEvent::Followed { followee, .. } => Some(followee),
            SocialEvent::PostLiked { creator, .. }
            | SocialEvent::PostCommented { creator, .. }
            | SocialEvent::PostSaved { creator, .. }
            | SocialEvent::StoryViewed { creator, .. } => Some(creator),
            SocialEvent::MessageSent { receiver, .. } => Some(receiver),
            SocialEvent::PostCreated { .. } | SocialEvent::StoryCreated { .. } => None,
        }
    }

    fn describe(&self, actor_name: &str) -> String {
        match self {
            SocialEvent::Followed { .. } => format!("{actor_name} started following you"),
            SocialEvent::PostLiked { .. } => format!("{actor_name} liked your post"),
            SocialEvent::PostCommented { .. } => format!("{actor_name} commented on your post"),
            SocialEvent::PostSaved { .. } => format!("{actor_name} saved your post"),
            SocialEvent::PostCreated { .. } => format!("{actor_name} shared a new post"),
            SocialEvent::StoryCreated { .. } => format!("{actor_name} posted a new story"),
            SocialEvent::StoryViewed { .. } => format!("{actor_name} viewed your story"),
            SocialEvent::MessageSent { .. } => format!("{actor_name} sent you a message"),
        }
    }

    fn notification(&self, recipient: UserId, actor: Option<&User>) -> CreateNotification {
        let actor_name = actor.map_or("Someone", |actor| actor.handle.get());
        let notification = CreateNotification::new(recipient, self.notification_kind(), self.actor())
            .with_message(self.describe(actor_name));

        match *self {
            SocialEvent::PostLiked { post, .. }
            | SocialEvent::PostSaved { post, .. }
            | SocialEvent::PostCreated { post, .. } => notification.with_post(post),
            SocialEvent::PostCommented { post, comment, .. } => {
                notification.with_post(post).with_comment(comment)
            }
            SocialEvent::StoryCreated { story, .. } | SocialEvent::StoryViewed { story, .. } => {
                notification.with_story(story)
            }
            SocialEvent::Followed { .. } | SocialEvent::MessageSent { .. } => notification,
        }
    }
}

#[async_trait]
pub trait PostCommitHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_commit(&self, event: &SocialEvent) -> Result<()>;
}

/// The observer list invoked once an action's write has committed.
#[derive(Clone, Default)]
pub struct PostCommitHooks {
    hooks: Vec<Arc<dyn PostCommitHook>>,
}

impl PostCommitHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, hook: impl PostCommitHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Runs every hook in registration order. Errors are logged per hook.
    pub async fn dispatch(&self, event: &SocialEvent) {
        for hook in &self.hooks {
            match hook.on_commit(event).await {
                Ok(()) => debug!(hook = hook.name(), ?event, "Post-commit hook ran"),
                Err(error) => warn!(
                    hook = hook.name(),
                    kind = %event.notification_kind(),
                    %error,
                    "Post-commit hook failed"
                ),
            }
        }
    }
}

/// Writes notifications for social events: one for direct events, one per
/// follower for new posts and stories, always in a single insert.
pub struct NotificationFanout {
    store: SharedStore,
}

impl NotificationFanout {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn recipients(&self, event: &SocialEvent) -> Result<Vec<UserId>> {
        let actor = event.actor();
        let recipients = match event.direct_recipient() {
            Some(recipient) => vec![recipient],
            None => self.store.follower_ids(actor).await?,
        };

        Ok(recipients
            .into_iter()
            .filter(|recipient| *recipient != actor)
            .collect())
    }
}

#[async_trait]
impl PostCommitHook for NotificationFanout {
    fn name(&self) -> &'static str {
        "notification_fanout"
    }

    async fn on_commit(&self, event: &SocialEvent) -> Result<()> {
        let recipients = self.recipients(event).await?;
        if recipients.is_empty() {
            return Ok(());
        }

        let actor = self.store.fetch_user(event.actor()).await?;
        let notifications: Vec<CreateNotification> = recipients
            .into_iter()
            .map(|recipient| event.notification(recipient, actor.as_ref()))
            .collect();

        let written = self.store.insert_notifications(&notifications).await?;
        debug!(written, kind = %event.notification_kind(), "Fanned out notifications");
        Ok(())
    }
}
