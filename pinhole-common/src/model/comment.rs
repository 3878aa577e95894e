use crate::model::{Id, post::PostId, user::UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

pub const COMMENT_MAX_LEN: usize = 2200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

pub type CommentId = Id<CommentMarker>;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post: PostId,
    pub created_by: UserId,
    pub text: String,
    pub parent_comment: Option<CommentId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateComment {
    pub post: PostId,
    pub created_by: UserId,
    pub text: String,
    pub parent_comment: Option<CommentId>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidCommentTextError {
    #[error("Comment text is required")]
    Empty,
    #[error("Comment text exceeds 2200 characters")]
    TooLong,
}

pub fn validate_comment_text(text: &str) -> Result<String, InvalidCommentTextError> {
    let text = text.trim();
    if text.is_empty() {
        Err(InvalidCommentTextError::Empty)
    } else if text.chars().count() > COMMENT_MAX_LEN {
        Err(InvalidCommentTextError::TooLong)
    } else {
        Ok(text.to_owned())
    }
}
