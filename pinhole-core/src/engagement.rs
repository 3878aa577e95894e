use crate::{
    error::{Result, ServiceError},
    hooks::{PostCommitHooks, SocialEvent},
};
use pinhole_common::model::{
    interaction::{EngagementKind, InteractionKind},
    post::{Post, PostId},
    user::UserId,
};
use pinhole_db::{DbError, SharedStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCount {
    pub post_id: PostId,
    pub likes: u64,
}

/// Likes and saves: unique `(user, post)` records that notify the creator.
#[derive(Clone)]
pub struct EngagementService {
    store: SharedStore,
    hooks: Arc<PostCommitHooks>,
}

fn already_exists(kind: EngagementKind) -> &'static str {
    match kind {
        EngagementKind::Like => "Post already liked",
        EngagementKind::Save => "Post already saved",
    }
}

fn missing(kind: EngagementKind) -> &'static str {
    match kind {
        EngagementKind::Like => "Like",
        EngagementKind::Save => "Save",
    }
}

impl EngagementService {
    #[must_use]
    pub fn new(store: SharedStore, hooks: Arc<PostCommitHooks>) -> Self {
        Self { store, hooks }
    }

    pub async fn like(&self, actor: UserId, post_id: PostId) -> Result<()> {
        self.engage(EngagementKind::Like, actor, post_id).await
    }

    pub async fn unlike(&self, actor: UserId, post_id: PostId) -> Result<()> {
        self.disengage(EngagementKind::Like, actor, post_id).await
    }

    pub async fn save(&self, actor: UserId, post_id: PostId) -> Result<()> {
        self.engage(EngagementKind::Save, actor, post_id).await
    }

    pub async fn unsave(&self, actor: UserId, post_id: PostId) -> Result<()> {
        self.disengage(EngagementKind::Save, actor, post_id).await
    }

    pub async fn like_count(&self, post_id: PostId) -> Result<LikeCount> {
        self.require_post(post_id).await?;
        let counts = self
            .store
            .count_interactions(InteractionKind::Like, &[post_id])
            .await?;

        Ok(LikeCount {
            post_id,
            likes: counts.get(&post_id).copied().unwrap_or(0),
        })
    }

    /// Duplicates are rejected by the store's unique `(user, post)` key.
    async fn engage(&self, kind: EngagementKind, actor: UserId, post_id: PostId) -> Result<()> {
        let post = self.require_post(post_id).await?;

        match self.store.add_engagement(kind, actor, post_id).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation(_)) => {
                return Err(ServiceError::Conflict(already_exists(kind).to_owned()));
            }
            Err(error) => return Err(error.into()),
        }
        debug!(?kind, %actor, post = %post_id, "Engaged with post");

        let creator = post.created_by;
        let event = match kind {
            EngagementKind::Like => SocialEvent::PostLiked {
                actor,
                post: post_id,
                creator,
            },
            EngagementKind::Save => SocialEvent::PostSaved {
                actor,
                post: post_id,
                creator,
            },
        };
        self.hooks.dispatch(&event).await;
        Ok(())
    }

    async fn disengage(&self, kind: EngagementKind, actor: UserId, post_id: PostId) -> Result<()> {
        if self.store.remove_engagement(kind, actor, post_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(missing(kind)))
        }
    }

    async fn require_post(&self, post_id: PostId) -> Result<Post> {
        self.store
            .fetch_post(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }
}
