use crate::model::{Id, post::Media, user::UserId};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Stories disappear this long after creation.
pub const STORY_TTL: Duration = Duration::hours(24);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct StoryMarker;

pub type StoryId = Id<StoryMarker>;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub created_by: UserId,
    pub media: Media,
    pub caption: String,
    pub music: Option<String>,
    pub viewers: Vec<UserId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateStory {
    pub media: Media,
    pub caption: String,
    pub music: Option<String>,
}

impl Story {
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.created_at + STORY_TTL
    }

    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at() <= now
    }
}

/// Stories created at or before this instant have expired.
#[must_use]
pub fn story_cutoff(now: OffsetDateTime) -> OffsetDateTime {
    now - STORY_TTL
}
