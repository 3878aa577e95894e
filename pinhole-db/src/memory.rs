//! An in-process [`Store`](crate::store::Store) for tests.
//!
//! Mirrors the constraint behavior of [`DbClient`](crate::client::DbClient):
//! duplicate handles and engagements are unique violations, missing parents
//! are foreign key violations and deletes cascade the same way. Every
//! operation is counted so tests can assert how many round trips a service
//! made.

use crate::{
    client::{DbError, Result},
    store::{
        CommentStore, FollowCounts, GraphStore, InteractionStore, MessageStore, NotificationStore,
        PostOrder, PostQuery, PostStore, StoryStore, UserStore,
    },
};
use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use pinhole_common::{
    model::{
        Id, PinholeSnowflakeGenerator,
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CommentId, CreateComment},
        interaction::{EngagementKind, InteractionKind},
        message::{CreateMessage, Message},
        notification::{CreateNotification, Notification, NotificationId},
        post::{CreatePost, Post, PostId, UpdatePost, normalize_tags},
        story::{CreateStory, Story, StoryId},
        user::{CreateUser, UpdateUser, User, UserId},
    },
    pagination::Window,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
};
use time::OffsetDateTime;

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    authentications: Vec<Authentication>,
    /// In insertion order.
    follows: Vec<(UserId, UserId)>,
    posts: BTreeMap<PostId, Post>,
    likes: HashSet<(UserId, PostId)>,
    saves: HashSet<(UserId, PostId)>,
    comments: BTreeMap<CommentId, Comment>,
    stories: BTreeMap<StoryId, Story>,
    notifications: BTreeMap<NotificationId, Notification>,
    messages: Vec<Message>,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    snowflake_generator: Mutex<PinholeSnowflakeGenerator>,
    /// Keeps timestamps strictly increasing so newest-first order is stable.
    last_millis: AtomicU64,
}

fn window_slice<T>(items: Vec<T>, window: Window) -> Vec<T> {
    let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation(constraint.to_owned())
}

fn foreign_key_violation(constraint: &str) -> DbError {
    DbError::ForeignKeyViolation(constraint.to_owned())
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How often `operation` (the trait method name) was called.
    #[must_use]
    pub fn calls(&self, operation: &str) -> usize {
        self.state.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Total calls across every operation.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Makes every following call of `operation` fail like a lost connection.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failing.clear();
    }

    pub fn insert_auth(&self, authentication: Authentication) {
        self.state.lock().authentications.push(authentication);
    }

    /// Inserts a story with an explicit creation time.
    pub fn insert_story_at(
        &self,
        creator: UserId,
        story: &CreateStory,
        created_at: OffsetDateTime,
    ) -> Story {
        let id = self.snowflake_generator.lock().generate_at(created_at).into();
        let story = Story {
            id,
            created_by: creator,
            media: story.media.clone(),
            caption: story.caption.clone(),
            music: story.music.clone(),
            viewers: Vec::new(),
            created_at,
        };
        self.state.lock().stories.insert(id, story.clone());
        story
    }

    /// Notifications of `recipient` in insertion order, outside of call
    /// counting.
    #[must_use]
    pub fn notifications_of(&self, recipient: UserId) -> Vec<Notification> {
        self.state
            .lock()
            .notifications
            .values()
            .filter(|notification| notification.recipient == recipient)
            .cloned()
            .collect()
    }

    fn enter(&self, operation: &'static str) -> Result<MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        *state.calls.entry(operation).or_default() += 1;
        if state.failing.contains(operation) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(state)
    }

    fn next_id<Marker>(&self) -> (Id<Marker>, OffsetDateTime) {
        let now = OffsetDateTime::now_utc();
        let now_millis = u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_millis.max(last + 1))
            })
            .unwrap_or_else(|previous| previous);
        let millis = now_millis.max(previous + 1);

        let created_at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .unwrap_or(now);
        let snowflake = self.snowflake_generator.lock().generate_at(created_at);
        (snowflake.into(), created_at)
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (OffsetDateTime, u64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn remove_post_cascade(state: &mut State, post_id: PostId) {
    let removed_comments: HashSet<CommentId> = state
        .comments
        .values()
        .filter(|comment| comment.post == post_id)
        .map(|comment| comment.id)
        .collect();
    state.comments.retain(|id, _| !removed_comments.contains(id));
    state.likes.retain(|(_, post)| *post != post_id);
    state.saves.retain(|(_, post)| *post != post_id);
    state.notifications.retain(|_, notification| {
        notification.post != Some(post_id)
            && notification
                .comment
                .is_none_or(|comment| !removed_comments.contains(&comment))
    });
}

fn remove_user_cascade(state: &mut State, user_id: UserId) {
    state
        .authentications
        .retain(|authentication| authentication.user != user_id);
    state
        .follows
        .retain(|(follower, followee)| *follower != user_id && *followee != user_id);

    let owned_posts: Vec<PostId> = state
        .posts
        .values()
        .filter(|post| post.created_by == user_id)
        .map(|post| post.id)
        .collect();
    for post_id in owned_posts {
        state.posts.remove(&post_id);
        remove_post_cascade(state, post_id);
    }
    state.likes.retain(|(user, _)| *user != user_id);
    state.saves.retain(|(user, _)| *user != user_id);

    let authored: Vec<Comment> = state
        .comments
        .values()
        .filter(|comment| comment.created_by == user_id)
        .cloned()
        .collect();
    for comment in &authored {
        state.comments.remove(&comment.id);
        if let Some(post) = state.posts.get_mut(&comment.post) {
            post.comment_count = post.comment_count.saturating_sub(1);
        }
    }
    let authored: HashSet<CommentId> = authored.iter().map(|comment| comment.id).collect();
    for reply in state.comments.values_mut() {
        if reply
            .parent_comment
            .is_some_and(|parent| authored.contains(&parent))
        {
            reply.parent_comment = None;
        }
    }

    let owned_stories: HashSet<StoryId> = state
        .stories
        .values()
        .filter(|story| story.created_by == user_id)
        .map(|story| story.id)
        .collect();
    state.stories.retain(|id, _| !owned_stories.contains(id));
    for story in state.stories.values_mut() {
        story.viewers.retain(|viewer| *viewer != user_id);
    }

    state.notifications.retain(|_, notification| {
        notification.recipient != user_id
            && notification.actor != user_id
            && notification
                .comment
                .is_none_or(|comment| !authored.contains(&comment))
            && notification
                .story
                .is_none_or(|story| !owned_stories.contains(&story))
    });
    state
        .messages
        .retain(|message| message.sender != user_id && message.receiver != user_id);
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let (id, created_at) = self.next_id();
        let mut state = self.enter("create_user")?;
        if state.users.values().any(|other| other.handle == user.handle) {
            return Err(unique_violation("users_handle_key"));
        }

        let user = User {
            id,
            handle: user.handle.clone(),
            name: user.name.clone(),
            bio: String::new(),
            profile_pic: String::new(),
            is_private: user.is_private,
            created_at,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>> {
        let state = self.enter("fetch_user")?;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn fetch_users(&self, user_ids: &[UserId]) -> Result<Vec<User>> {
        let state = self.enter("fetch_users")?;
        let wanted: HashSet<_> = user_ids.iter().collect();
        Ok(state
            .users
            .values()
            .filter(|user| wanted.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn update_user(&self, user_id: UserId, update: &UpdateUser) -> Result<Option<User>> {
        let mut state = self.enter("update_user")?;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            user.name.clone_from(name);
        }
        if let Some(bio) = &update.bio {
            user.bio.clone_from(bio);
        }
        if let Some(is_private) = update.is_private {
            user.is_private = is_private;
        }
        if let Some(profile_pic) = &update.profile_pic {
            user.profile_pic.clone_from(profile_pic);
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool> {
        let mut state = self.enter("delete_user")?;
        if state.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        remove_user_cascade(&mut state, user_id);
        Ok(true)
    }

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let state = self.enter("fetch_auth")?;
        Ok(state
            .authentications
            .iter()
            .find(|authentication| authentication.token_hash == *token_hash)
            .cloned())
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let state = self.enter("is_following")?;
        Ok(state.follows.contains(&(follower, followee)))
    }

    async fn follow(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let mut state = self.enter("follow")?;
        if follower == followee {
            return Err(DbError::Sqlx(sqlx::Error::Protocol(
                "follows_check violated".into(),
            )));
        }
        if !state.users.contains_key(&follower) || !state.users.contains_key(&followee) {
            return Err(foreign_key_violation("follows_followee_snowflake_fkey"));
        }
        if state.follows.contains(&(follower, followee)) {
            return Ok(false);
        }
        state.follows.push((follower, followee));
        Ok(true)
    }

    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let mut state = self.enter("unfollow")?;
        let before = state.follows.len();
        state.follows.retain(|edge| *edge != (follower, followee));
        Ok(state.follows.len() < before)
    }

    async fn following_ids(&self, user: UserId) -> Result<Vec<UserId>> {
        let state = self.enter("following_ids")?;
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(follower, _)| *follower == user)
            .map(|(_, followee)| *followee)
            .collect())
    }

    async fn follower_ids(&self, user: UserId) -> Result<Vec<UserId>> {
        let state = self.enter("follower_ids")?;
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(_, followee)| *followee == user)
            .map(|(follower, _)| *follower)
            .collect())
    }

    async fn following_of_many(&self, users: &[UserId]) -> Result<Vec<UserId>> {
        let state = self.enter("following_of_many")?;
        let mut ids: Vec<UserId> = state
            .follows
            .iter()
            .filter(|(follower, _)| users.contains(follower))
            .map(|(_, followee)| *followee)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn followed_among(
        &self,
        follower: UserId,
        candidates: &[UserId],
    ) -> Result<HashSet<UserId>> {
        let state = self.enter("followed_among")?;
        Ok(state
            .follows
            .iter()
            .filter(|(from, to)| *from == follower && candidates.contains(to))
            .map(|(_, to)| *to)
            .collect())
    }

    async fn count_follows(&self, user: UserId) -> Result<FollowCounts> {
        let state = self.enter("count_follows")?;
        let followers = state.follows.iter().filter(|(_, to)| *to == user).count();
        let following = state.follows.iter().filter(|(from, _)| *from == user).count();
        Ok(FollowCounts {
            followers: followers as u64,
            following: following as u64,
        })
    }
}

fn query_posts(state: &State, query: &PostQuery) -> Vec<Post> {
    let mut posts: Vec<Post> = state
        .posts
        .values()
        .filter(|post| {
            query.matches(post, |user| state.saves.contains(&(user, post.id)))
        })
        .cloned()
        .collect();

    newest_first(&mut posts, |post| (post.created_at, post.id.into()));
    if let PostOrder::FollowedFirst { viewer } = query.order {
        posts.sort_by_key(|post| !state.follows.contains(&(viewer, post.created_by)));
    }
    posts
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, creator: UserId, post: &CreatePost) -> Result<Post> {
        let (id, created_at) = self.next_id();
        let mut state = self.enter("create_post")?;
        if !state.users.contains_key(&creator) {
            return Err(foreign_key_violation("posts_user_snowflake_fkey"));
        }

        let post = Post {
            id,
            created_by: creator,
            media: post.media().to_vec(),
            caption: post.caption().to_owned(),
            tags: post.tags().to_vec(),
            is_archived: false,
            comment_count: 0,
            created_at,
        };
        state.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn fetch_post(&self, post_id: PostId) -> Result<Option<Post>> {
        let state = self.enter("fetch_post")?;
        Ok(state.posts.get(&post_id).cloned())
    }

    async fn update_post(&self, post_id: PostId, update: &UpdatePost) -> Result<Option<Post>> {
        let mut state = self.enter("update_post")?;
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        if let Some(caption) = &update.caption {
            post.caption.clone_from(caption);
        }
        if let Some(tags) = &update.tags {
            post.tags = normalize_tags(tags.iter().cloned());
        }
        if let Some(is_archived) = update.is_archived {
            post.is_archived = is_archived;
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: PostId) -> Result<bool> {
        let mut state = self.enter("delete_post")?;
        if state.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        remove_post_cascade(&mut state, post_id);
        Ok(true)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        let state = self.enter("count_posts")?;
        Ok(query_posts(&state, query).len() as u64)
    }

    async fn fetch_posts(&self, query: &PostQuery, window: Window) -> Result<Vec<Post>> {
        let state = self.enter("fetch_posts")?;
        Ok(window_slice(query_posts(&state, query), window))
    }
}

impl State {
    fn engagements(&mut self, kind: EngagementKind) -> &mut HashSet<(UserId, PostId)> {
        match kind {
            EngagementKind::Like => &mut self.likes,
            EngagementKind::Save => &mut self.saves,
        }
    }

    fn interactions(&self, kind: InteractionKind) -> Vec<(UserId, PostId)> {
        match kind {
            InteractionKind::Like => self.likes.iter().copied().collect(),
            InteractionKind::Save => self.saves.iter().copied().collect(),
            InteractionKind::Comment => self
                .comments
                .values()
                .map(|comment| (comment.created_by, comment.post))
                .collect(),
        }
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn add_engagement(
        &self,
        kind: EngagementKind,
        user: UserId,
        post: PostId,
    ) -> Result<()> {
        let mut state = self.enter("add_engagement")?;
        if !state.posts.contains_key(&post) {
            return Err(foreign_key_violation("post_snowflake_fkey"));
        }
        if !state.engagements(kind).insert((user, post)) {
            let constraint = match kind {
                EngagementKind::Like => "likes_pkey",
                EngagementKind::Save => "saves_pkey",
            };
            return Err(unique_violation(constraint));
        }
        Ok(())
    }

    async fn remove_engagement(
        &self,
        kind: EngagementKind,
        user: UserId,
        post: PostId,
    ) -> Result<bool> {
        let mut state = self.enter("remove_engagement")?;
        Ok(state.engagements(kind).remove(&(user, post)))
    }

    async fn count_interactions(
        &self,
        kind: InteractionKind,
        posts: &[PostId],
    ) -> Result<HashMap<PostId, u64>> {
        let state = self.enter("count_interactions")?;
        let mut counts = HashMap::new();
        for (_, post) in state.interactions(kind) {
            if posts.contains(&post) {
                *counts.entry(post).or_default() += 1;
            }
        }
        Ok(counts)
    }

    async fn interacted_posts(
        &self,
        kind: InteractionKind,
        user: UserId,
        posts: &[PostId],
    ) -> Result<HashSet<PostId>> {
        let state = self.enter("interacted_posts")?;
        Ok(state
            .interactions(kind)
            .into_iter()
            .filter(|(by, post)| *by == user && posts.contains(post))
            .map(|(_, post)| post)
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let (id, created_at) = self.next_id();
        let mut state = self.enter("create_comment")?;
        let Some(post) = state.posts.get_mut(&comment.post) else {
            return Err(foreign_key_violation("comments_post_snowflake_fkey"));
        };
        post.comment_count += 1;

        let comment = Comment {
            id,
            post: comment.post,
            created_by: comment.created_by,
            text: comment.text.clone(),
            parent_comment: comment.parent_comment,
            created_at,
        };
        state.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn fetch_comment(&self, comment_id: CommentId) -> Result<Option<Comment>> {
        let state = self.enter("fetch_comment")?;
        Ok(state.comments.get(&comment_id).cloned())
    }

    async fn update_comment(
        &self,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Option<Comment>> {
        let mut state = self.enter("update_comment")?;
        Ok(state.comments.get_mut(&comment_id).map(|comment| {
            text.clone_into(&mut comment.text);
            comment.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<bool> {
        let mut state = self.enter("delete_comment")?;
        let Some(comment) = state.comments.remove(&comment_id) else {
            return Ok(false);
        };

        for reply in state.comments.values_mut() {
            if reply.parent_comment == Some(comment_id) {
                reply.parent_comment = None;
            }
        }
        state
            .notifications
            .retain(|_, notification| notification.comment != Some(comment_id));
        if let Some(post) = state.posts.get_mut(&comment.post) {
            post.comment_count = post.comment_count.saturating_sub(1);
        }
        Ok(true)
    }

    async fn count_comments(&self, post_id: PostId) -> Result<u64> {
        let state = self.enter("count_comments")?;
        Ok(state
            .comments
            .values()
            .filter(|comment| comment.post == post_id)
            .count() as u64)
    }

    async fn fetch_comments(&self, post_id: PostId, window: Window) -> Result<Vec<Comment>> {
        let state = self.enter("fetch_comments")?;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| comment.post == post_id)
            .cloned()
            .collect();
        newest_first(&mut comments, |comment| {
            (comment.created_at, comment.id.into())
        });
        Ok(window_slice(comments, window))
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn create_story(&self, creator: UserId, story: &CreateStory) -> Result<Story> {
        let (id, created_at) = self.next_id();
        let mut state = self.enter("create_story")?;
        let story = Story {
            id,
            created_by: creator,
            media: story.media.clone(),
            caption: story.caption.clone(),
            music: story.music.clone(),
            viewers: Vec::new(),
            created_at,
        };
        state.stories.insert(id, story.clone());
        Ok(story)
    }

    async fn fetch_story(&self, story_id: StoryId) -> Result<Option<Story>> {
        let state = self.enter("fetch_story")?;
        Ok(state.stories.get(&story_id).cloned())
    }

    async fn add_story_viewer(&self, story_id: StoryId, viewer: UserId) -> Result<bool> {
        let mut state = self.enter("add_story_viewer")?;
        let Some(story) = state.stories.get_mut(&story_id) else {
            return Err(foreign_key_violation("viewers_story_snowflake_fkey"));
        };
        if story.viewers.contains(&viewer) {
            return Ok(false);
        }
        story.viewers.push(viewer);
        Ok(true)
    }

    async fn delete_story(&self, story_id: StoryId) -> Result<bool> {
        let mut state = self.enter("delete_story")?;
        if state.stories.remove(&story_id).is_none() {
            return Ok(false);
        }
        state
            .notifications
            .retain(|_, notification| notification.story != Some(story_id));
        Ok(true)
    }

    async fn purge_stories(&self, cutoff: OffsetDateTime) -> Result<u64> {
        let mut state = self.enter("purge_stories")?;
        let expired: Vec<StoryId> = state
            .stories
            .values()
            .filter(|story| story.created_at <= cutoff)
            .map(|story| story.id)
            .collect();
        for story_id in &expired {
            state.stories.remove(story_id);
        }
        state.notifications.retain(|_, notification| {
            notification
                .story
                .is_none_or(|story| !expired.contains(&story))
        });
        Ok(expired.len() as u64)
    }

    async fn fetch_stories(&self, cutoff: OffsetDateTime) -> Result<Vec<Story>> {
        let state = self.enter("fetch_stories")?;
        let mut stories: Vec<Story> = state
            .stories
            .values()
            .filter(|story| story.created_at > cutoff)
            .cloned()
            .collect();
        newest_first(&mut stories, |story| (story.created_at, story.id.into()));
        Ok(stories)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notifications(&self, notifications: &[CreateNotification]) -> Result<u64> {
        let rows: Vec<(NotificationId, OffsetDateTime)> =
            notifications.iter().map(|_| self.next_id()).collect();
        let mut state = self.enter("insert_notifications")?;

        for ((id, created_at), notification) in rows.into_iter().zip(notifications) {
            state.notifications.insert(
                id,
                Notification {
                    id,
                    recipient: notification.recipient,
                    kind: notification.kind,
                    actor: notification.actor,
                    post: notification.post,
                    comment: notification.comment,
                    story: notification.story,
                    is_read: false,
                    message: notification.message.clone(),
                    created_at,
                },
            );
        }
        Ok(notifications.len() as u64)
    }

    async fn fetch_notification(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>> {
        let state = self.enter("fetch_notification")?;
        Ok(state.notifications.get(&notification_id).cloned())
    }

    async fn count_notifications(&self, recipient: UserId) -> Result<u64> {
        let state = self.enter("count_notifications")?;
        Ok(state
            .notifications
            .values()
            .filter(|notification| notification.recipient == recipient)
            .count() as u64)
    }

    async fn fetch_notifications(
        &self,
        recipient: UserId,
        window: Window,
    ) -> Result<Vec<Notification>> {
        let state = self.enter("fetch_notifications")?;
        let mut notifications: Vec<Notification> = state
            .notifications
            .values()
            .filter(|notification| notification.recipient == recipient)
            .cloned()
            .collect();
        newest_first(&mut notifications, |notification| {
            (notification.created_at, notification.id.into())
        });
        Ok(window_slice(notifications, window))
    }

    async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<bool> {
        let mut state = self.enter("mark_notification_read")?;
        let Some(notification) = state.notifications.get_mut(&notification_id) else {
            return Ok(false);
        };
        notification.is_read = true;
        Ok(true)
    }

    async fn mark_all_notifications_read(&self, recipient: UserId) -> Result<u64> {
        let mut state = self.enter("mark_all_notifications_read")?;
        let mut marked = 0;
        for notification in state.notifications.values_mut() {
            if notification.recipient == recipient && !notification.is_read {
                notification.is_read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> Result<bool> {
        let mut state = self.enter("delete_notification")?;
        Ok(state.notifications.remove(&notification_id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, message: &CreateMessage) -> Result<Message> {
        let (id, created_at) = self.next_id();
        let mut state = self.enter("create_message")?;
        let message = Message {
            id,
            sender: message.sender,
            receiver: message.receiver,
            text: message.text.clone(),
            file_url: message.file_url.clone(),
            chat_id: message.chat_id(),
            created_at,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn count_messages(&self, chat_id: &str) -> Result<u64> {
        let state = self.enter("count_messages")?;
        Ok(state
            .messages
            .iter()
            .filter(|message| message.chat_id == chat_id)
            .count() as u64)
    }

    async fn fetch_messages(&self, chat_id: &str, window: Window) -> Result<Vec<Message>> {
        let state = self.enter("fetch_messages")?;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|message| message.chat_id == chat_id)
            .cloned()
            .collect();
        newest_first(&mut messages, |message| {
            (message.created_at, message.id.into())
        });
        Ok(window_slice(messages, window))
    }
}
