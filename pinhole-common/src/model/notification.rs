use crate::model::{
    Id, ModelValidationError, comment::CommentId, post::PostId, story::StoryId, user::UserId,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct NotificationMarker;

pub type NotificationId = Id<NotificationMarker>;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Save,
    Post,
    Story,
    StoryView,
    Mention,
    Tag,
    Message,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub actor: UserId,
    pub post: Option<PostId>,
    pub comment: Option<CommentId>,
    pub story: Option<StoryId>,
    pub is_read: bool,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateNotification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub actor: UserId,
    pub post: Option<PostId>,
    pub comment: Option<CommentId>,
    pub story: Option<StoryId>,
    pub message: String,
}

impl CreateNotification {
    #[must_use]
    pub fn new(recipient: UserId, kind: NotificationKind, actor: UserId) -> Self {
        Self {
            recipient,
            kind,
            actor,
            post: None,
            comment: None,
            story: None,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn with_post(mut self, post: PostId) -> Self {
        self.post = Some(post);
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: CommentId) -> Self {
        self.comment = Some(comment);
        self
    }

    #[must_use]
    pub fn with_story(mut self, story: StoryId) -> Self {
        self.story = Some(story);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Save => "save",
            NotificationKind::Post => "post",
            NotificationKind::Story => "story",
            NotificationKind::StoryView => "story_view",
            NotificationKind::Mention => "mention",
            NotificationKind::Tag => "tag",
            NotificationKind::Message => "message",
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = ModelValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "like" => NotificationKind::Like,
            "comment" => NotificationKind::Comment,
            "follow" => NotificationKind::Follow,
            "save" => NotificationKind::Save,
            "post" => NotificationKind::Post,
            "story" => NotificationKind::Story,
            "story_view" => NotificationKind::StoryView,
            "mention" => NotificationKind::Mention,
            "tag" => NotificationKind::Tag,
            "message" => NotificationKind::Message,
            other => {
                return Err(ModelValidationError::UnknownVariant {
                    kind: "notification type",
                    value: other.to_owned(),
                });
            }
        })
    }
}
