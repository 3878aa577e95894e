use pinhole_common::model::{
    Id, ModelValidationError,
    auth::Authentication,
    comment::Comment,
    message::Message,
    notification::Notification,
    post::{Media, Post},
    story::Story,
    user::{User, UserHandle},
};
use sqlx::{FromRow, types::Json};
use time::{Duration, OffsetDateTime};

pub(crate) fn count_from_db(count: i64) -> u64 {
    count.max(0).cast_unsigned()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_snowflake: i64,
    pub handle: String,
    pub name: String,
    pub bio: String,
    pub profile_pic: String,
    pub is_private: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub post_snowflake: i64,
    pub user_snowflake: i64,
    pub media: Json<Vec<Media>>,
    pub caption: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub comment_count: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_snowflake: i64,
    pub post_snowflake: i64,
    pub user_snowflake: i64,
    pub text: String,
    pub parent_comment_snowflake: Option<i64>,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct StoryRecord {
    pub story_snowflake: i64,
    pub user_snowflake: i64,
    pub media: Json<Media>,
    pub caption: String,
    pub music: Option<String>,
    pub viewers: Vec<i64>,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct NotificationRecord {
    pub notification_snowflake: i64,
    pub recipient_snowflake: i64,
    pub kind: String,
    pub actor_snowflake: i64,
    pub post_snowflake: Option<i64>,
    pub comment_snowflake: Option<i64>,
    pub story_snowflake: Option<i64>,
    pub is_read: bool,
    pub message: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct MessageRecord {
    pub message_snowflake: i64,
    pub sender_snowflake: i64,
    pub receiver_snowflake: i64,
    pub text: String,
    pub file_url: String,
    pub chat_id: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_snowflake: i64,
    pub token_hash: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.user_snowflake),
            handle: UserHandle::new(value.handle)?,
            name: value.name,
            bio: value.bio,
            profile_pic: value.profile_pic,
            is_private: value.is_private,
            created_at: value.created_at,
        })
    }
}

impl From<PostRecord> for Post {
    fn from(value: PostRecord) -> Self {
        Self {
            id: Id::from_db(value.post_snowflake),
            created_by: Id::from_db(value.user_snowflake),
            media: value.media.0,
            caption: value.caption,
            tags: value.tags,
            is_archived: value.is_archived,
            comment_count: count_from_db(value.comment_count),
            created_at: value.created_at,
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(value: CommentRecord) -> Self {
        Self {
            id: Id::from_db(value.comment_snowflake),
            post: Id::from_db(value.post_snowflake),
            created_by: Id::from_db(value.user_snowflake),
            text: value.text,
            parent_comment: value.parent_comment_snowflake.map(Id::from_db),
            created_at: value.created_at,
        }
    }
}

impl From<StoryRecord> for Story {
    fn from(value: StoryRecord) -> Self {
        Self {
            id: Id::from_db(value.story_snowflake),
            created_by: Id::from_db(value.user_snowflake),
            media: value.media.0,
            caption: value.caption,
            music: value.music,
            viewers: value.viewers.into_iter().map(Id::from_db).collect(),
            created_at: value.created_at,
        }
    }
}

impl TryFrom<NotificationRecord> for Notification {
    type Error = ModelValidationError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.notification_snowflake),
            recipient: Id::from_db(value.recipient_snowflake),
            kind: value.kind.parse()?,
            actor: Id::from_db(value.actor_snowflake),
            post: value.post_snowflake.map(Id::from_db),
            comment: value.comment_snowflake.map(Id::from_db),
            story: value.story_snowflake.map(Id::from_db),
            is_read: value.is_read,
            message: value.message,
            created_at: value.created_at,
        })
    }
}

impl From<MessageRecord> for Message {
    fn from(value: MessageRecord) -> Self {
        Self {
            id: Id::from_db(value.message_snowflake),
            sender: Id::from_db(value.sender_snowflake),
            receiver: Id::from_db(value.receiver_snowflake),
            text: value.text,
            file_url: value.file_url,
            chat_id: value.chat_id,
            created_at: value.created_at,
        }
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: Id::from_db(value.user_snowflake),
            token_hash: value.token_hash.try_into()?,
            created_at: value.created_at,
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}
