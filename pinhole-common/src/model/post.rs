use crate::model::{Id, ModelValidationError, user::UserId};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use time::OffsetDateTime;

pub const CAPTION_MAX_LEN: usize = 2200;
pub const POST_MEDIA_MAX_COUNT: usize = 10;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

pub type PostId = Id<PostMarker>;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Media {
    pub url: String,
    pub kind: MediaKind,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub created_by: UserId,
    pub media: Vec<Media>,
    pub caption: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub comment_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated post, ready to be written.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    media: Vec<Media>,
    caption: String,
    tags: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    pub caption: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_archived: Option<bool>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidMediaError {
    #[error("At least one media file (image or video) is required")]
    Empty,
    #[error("At most 10 media files are allowed")]
    TooMany,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The caption exceeds 2200 characters")]
pub struct InvalidCaptionError;

impl MediaKind {
    /// Maps an upload's declared content type onto a media kind.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.starts_with("image/") {
            Some(Self::Image)
        } else if content_type.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ModelValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(ModelValidationError::UnknownVariant {
                kind: "media kind",
                value: other.to_owned(),
            }),
        }
    }
}

impl Post {
    #[must_use]
    pub fn has_video(&self) -> bool {
        self.media.iter().any(|media| media.kind == MediaKind::Video)
    }
}

impl CreatePost {
    pub fn new(
        media: Vec<Media>,
        caption: &str,
        tags: Vec<String>,
    ) -> Result<Self, ModelValidationError> {
        if media.is_empty() {
            return Err(InvalidMediaError::Empty.into());
        }
        if media.len() > POST_MEDIA_MAX_COUNT {
            return Err(InvalidMediaError::TooMany.into());
        }

        Ok(Self {
            media,
            caption: validate_caption(caption)?,
            tags: normalize_tags(tags),
        })
    }

    #[must_use]
    pub fn media(&self) -> &[Media] {
        &self.media
    }

    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

pub fn validate_caption(caption: &str) -> Result<String, InvalidCaptionError> {
    let caption = caption.trim();
    if caption.chars().count() > CAPTION_MAX_LEN {
        return Err(InvalidCaptionError);
    }
    Ok(caption.to_owned())
}

/// Trims and lowercases tags, dropping empties and repeats but keeping order.
#[must_use]
pub fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Splits a comma separated tag list as sent by upload forms.
#[must_use]
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(',').map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use crate::model::{
        ModelValidationError,
        post::{CreatePost, InvalidMediaError, Media, MediaKind, parse_tag_list},
    };

    fn image() -> Media {
        Media {
            url: "/uploads/a.png".into(),
            kind: MediaKind::Image,
        }
    }

    #[test]
    fn post_requires_media() {
        assert_eq!(
            CreatePost::new(Vec::new(), "caption", Vec::new()),
            Err(ModelValidationError::Media(InvalidMediaError::Empty))
        );
        assert!(CreatePost::new(vec![image()], "caption", Vec::new()).is_ok());
    }

    #[test]
    fn caption_is_limited() {
        assert!(CreatePost::new(vec![image()], &"a".repeat(2201), Vec::new()).is_err());
        assert!(CreatePost::new(vec![image()], &"a".repeat(2200), Vec::new()).is_ok());
    }

    #[test]
    fn tags_are_normalized() {
        assert_eq!(
            parse_tag_list(" Sun, beach,,SUN , Sea"),
            vec!["sun".to_owned(), "beach".to_owned(), "sea".to_owned()]
        );
    }

    #[test]
    fn media_kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_content_type("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_content_type("application/pdf"), None);
    }
}
