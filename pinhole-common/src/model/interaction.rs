use serde::{Deserialize, Serialize};

/// The kinds of interaction counted per post.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum InteractionKind {
    Like,
    Comment,
    Save,
}

/// Interactions stored as a bare `(user, post)` join record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum EngagementKind {
    Like,
    Save,
}

/// Per-post interaction counts and whether the requesting user took part.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSummary {
    pub like_count: u64,
    pub is_liked_by_user: bool,
    pub comment_count: u64,
    pub is_commented_by_user: bool,
    pub save_count: u64,
    pub is_saved_by_user: bool,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 3] = [Self::Like, Self::Comment, Self::Save];
}

impl From<EngagementKind> for InteractionKind {
    fn from(value: EngagementKind) -> Self {
        match value {
            EngagementKind::Like => InteractionKind::Like,
            EngagementKind::Save => InteractionKind::Save,
        }
    }
}

impl InteractionSummary {
    pub fn set_count(&mut self, kind: InteractionKind, count: u64) {
        match kind {
            InteractionKind::Like => self.like_count = count,
            InteractionKind::Comment => self.comment_count = count,
            InteractionKind::Save => self.save_count = count,
        }
    }

    pub fn set_by_user(&mut self, kind: InteractionKind, by_user: bool) {
        match kind {
            InteractionKind::Like => self.is_liked_by_user = by_user,
            InteractionKind::Comment => self.is_commented_by_user = by_user,
            InteractionKind::Save => self.is_saved_by_user = by_user,
        }
    }
}
