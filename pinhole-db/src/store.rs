//! The entity store, split by concern.
//!
//! Every trait is object safe so the services can hold a [`SharedStore`].
//! Batch operations take slices and answer with one round trip no matter how
//! many ids they are given.

use crate::client::Result;
use async_trait::async_trait;
use pinhole_common::{
    model::{
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CommentId, CreateComment},
        interaction::{EngagementKind, InteractionKind},
        message::{CreateMessage, Message},
        notification::{CreateNotification, Notification, NotificationId},
        post::{CreatePost, Post, PostId, UpdatePost},
        story::{CreateStory, Story, StoryId},
        user::{CreateUser, UpdateUser, User, UserId},
    },
    pagination::Window,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use time::OffsetDateTime;

pub type SharedStore = Arc<dyn Store>;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Which posts a listing covers.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostFilter {
    pub created_by: Option<UserId>,
    pub saved_by: Option<UserId>,
    pub videos_only: bool,
    pub include_archived: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum PostOrder {
    /// `created_at` descending.
    #[default]
    Newest,
    /// Posts by creators `viewer` follows first, each group newest first.
    FollowedFirst { viewer: UserId },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostQuery {
    pub filter: PostFilter,
    pub order: PostOrder,
}

impl PostQuery {
    /// Every live post, newest first.
    #[must_use]
    pub fn feed() -> Self {
        Self::default()
    }

    /// Live posts carrying at least one video, followed creators first.
    #[must_use]
    pub fn reels(viewer: UserId) -> Self {
        Self {
            filter: PostFilter {
                videos_only: true,
                ..PostFilter::default()
            },
            order: PostOrder::FollowedFirst { viewer },
        }
    }

    #[must_use]
    pub fn created_by(user: UserId) -> Self {
        Self {
            filter: PostFilter {
                created_by: Some(user),
                ..PostFilter::default()
            },
            order: PostOrder::Newest,
        }
    }

    #[must_use]
    pub fn saved_by(user: UserId) -> Self {
        Self {
            filter: PostFilter {
                saved_by: Some(user),
                ..PostFilter::default()
            },
            order: PostOrder::Newest,
        }
    }

    #[must_use]
    pub fn matches(&self, post: &Post, saved: impl FnOnce(UserId) -> bool) -> bool {
        let filter = &self.filter;
        (filter.include_archived || !post.is_archived)
            && (!filter.videos_only || post.has_video())
            && filter.created_by.is_none_or(|user| post.created_by == user)
            && filter.saved_by.is_none_or(saved)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Unknown ids are skipped.
    async fn fetch_users(&self, user_ids: &[UserId]) -> Result<Vec<User>>;

    async fn update_user(&self, user_id: UserId, update: &UpdateUser) -> Result<Option<User>>;

    /// Deletes the user and everything they own or took part in. Comment
    /// counters of other users' posts drop by the removed comments.
    async fn delete_user(&self, user_id: UserId) -> Result<bool>;

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>>;
}

/// The follow relation. One row per `(follower, followee)`; both directions
/// are read from it.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool>;

    /// Returns whether a new edge was written.
    async fn follow(&self, follower: UserId, followee: UserId) -> Result<bool>;

    /// Returns whether an edge was removed.
    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<bool>;

    async fn following_ids(&self, user: UserId) -> Result<Vec<UserId>>;

    async fn follower_ids(&self, user: UserId) -> Result<Vec<UserId>>;

    /// Everyone followed by at least one of `users`, deduplicated.
    async fn following_of_many(&self, users: &[UserId]) -> Result<Vec<UserId>>;

    /// The subset of `candidates` that `follower` follows.
    async fn followed_among(
        &self,
        follower: UserId,
        candidates: &[UserId],
    ) -> Result<HashSet<UserId>>;

    async fn count_follows(&self, user: UserId) -> Result<FollowCounts>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, creator: UserId, post: &CreatePost) -> Result<Post>;

    async fn fetch_post(&self, post_id: PostId) -> Result<Option<Post>>;

    async fn update_post(&self, post_id: PostId, update: &UpdatePost) -> Result<Option<Post>>;

    /// Comments, likes, saves and notifications of the post go with it.
    async fn delete_post(&self, post_id: PostId) -> Result<bool>;

    async fn count_posts(&self, query: &PostQuery) -> Result<u64>;

    async fn fetch_posts(&self, query: &PostQuery, window: Window) -> Result<Vec<Post>>;
}

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Fails with [`DbError::UniqueViolation`](crate::client::DbError) when
    /// the pair already exists.
    async fn add_engagement(&self, kind: EngagementKind, user: UserId, post: PostId)
    -> Result<()>;

    async fn remove_engagement(
        &self,
        kind: EngagementKind,
        user: UserId,
        post: PostId,
    ) -> Result<bool>;

    /// Grouped counts. Posts without any interaction are absent from the map.
    async fn count_interactions(
        &self,
        kind: InteractionKind,
        posts: &[PostId],
    ) -> Result<HashMap<PostId, u64>>;

    /// The subset of `posts` that `user` interacted with.
    async fn interacted_posts(
        &self,
        kind: InteractionKind,
        user: UserId,
        posts: &[PostId],
    ) -> Result<HashSet<PostId>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Inserts the comment and bumps the post's comment counter atomically.
    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment>;

    async fn fetch_comment(&self, comment_id: CommentId) -> Result<Option<Comment>>;

    async fn update_comment(&self, comment_id: CommentId, text: &str)
    -> Result<Option<Comment>>;

    /// Removes the comment and decrements the counter, never below zero.
    async fn delete_comment(&self, comment_id: CommentId) -> Result<bool>;

    async fn count_comments(&self, post_id: PostId) -> Result<u64>;

    async fn fetch_comments(&self, post_id: PostId, window: Window) -> Result<Vec<Comment>>;
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn create_story(&self, creator: UserId, story: &CreateStory) -> Result<Story>;

    async fn fetch_story(&self, story_id: StoryId) -> Result<Option<Story>>;

    /// Returns whether the viewer was new.
    async fn add_story_viewer(&self, story_id: StoryId, viewer: UserId) -> Result<bool>;

    async fn delete_story(&self, story_id: StoryId) -> Result<bool>;

    /// Deletes stories created at or before `cutoff`.
    async fn purge_stories(&self, cutoff: OffsetDateTime) -> Result<u64>;

    /// Stories created after `cutoff`, newest first.
    async fn fetch_stories(&self, cutoff: OffsetDateTime) -> Result<Vec<Story>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Writes all notifications in a single statement.
    async fn insert_notifications(&self, notifications: &[CreateNotification]) -> Result<u64>;

    async fn fetch_notification(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>>;

    async fn count_notifications(&self, recipient: UserId) -> Result<u64>;

    async fn fetch_notifications(
        &self,
        recipient: UserId,
        window: Window,
    ) -> Result<Vec<Notification>>;

    async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<bool>;

    async fn mark_all_notifications_read(&self, recipient: UserId) -> Result<u64>;

    async fn delete_notification(&self, notification_id: NotificationId) -> Result<bool>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, message: &CreateMessage) -> Result<Message>;

    async fn count_messages(&self, chat_id: &str) -> Result<u64>;

    async fn fetch_messages(&self, chat_id: &str, window: Window) -> Result<Vec<Message>>;
}

pub trait Store:
    UserStore
    + GraphStore
    + PostStore
    + InteractionStore
    + CommentStore
    + StoryStore
    + NotificationStore
    + MessageStore
{
}

impl<T> Store for T where
    T: UserStore
        + GraphStore
        + PostStore
        + InteractionStore
        + CommentStore
        + StoryStore
        + NotificationStore
        + MessageStore
{
}
