use crate::{
    error::{Result, ServiceError},
    hooks::{PostCommitHooks, SocialEvent},
};
use pinhole_common::model::user::{User, UserId, UserSummary};
use pinhole_db::SharedStore;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct FollowOutcome {
    pub followed: bool,
}

/// Follow relations between users, read from the single follow table.
#[derive(Clone)]
pub struct SocialGraph {
    store: SharedStore,
    hooks: Arc<PostCommitHooks>,
}

impl SocialGraph {
    #[must_use]
    pub fn new(store: SharedStore, hooks: Arc<PostCommitHooks>) -> Self {
        Self { store, hooks }
    }

    pub async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool> {
        Ok(self.store.is_following(follower, followee).await?)
    }

    /// Follows `target` if `actor` does not follow them yet, unfollows
    /// otherwise. Only a new follow notifies the target.
    pub async fn toggle_follow(&self, actor: UserId, target: UserId) -> Result<FollowOutcome> {
        if actor == target {
            return Err(ServiceError::invalid_input("You cannot follow yourself"));
        }

        let target_user = self
            .store
            .fetch_user(target)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        if self.store.is_following(actor, target).await? {
            self.store.unfollow(actor, target).await?;
            debug!(%actor, %target, "Unfollowed");
            return Ok(FollowOutcome { followed: false });
        }

        if target_user.is_private {
            return Err(ServiceError::Forbidden("private account"));
        }

        if self.store.follow(actor, target).await? {
            debug!(%actor, %target, "Followed");
            self.hooks
                .dispatch(&SocialEvent::Followed {
                    follower: actor,
                    followee: target,
                })
                .await;
        }
        Ok(FollowOutcome { followed: true })
    }

    /// Users followed by someone `user` follows, excluding `user` and the
    /// users they already follow.
    pub async fn second_degree(&self, user: UserId) -> Result<Vec<UserId>> {
        let following = self.store.following_ids(user).await?;
        if following.is_empty() {
            return Ok(Vec::new());
        }

        let direct: HashSet<UserId> = following.iter().copied().collect();
        let candidates = self.store.following_of_many(&following).await?;
        Ok(candidates
            .into_iter()
            .filter(|candidate| *candidate != user && !direct.contains(candidate))
            .collect())
    }

    pub async fn followers(&self, user: UserId) -> Result<Vec<UserSummary>> {
        self.require_user(user).await?;
        let ids = self.store.follower_ids(user).await?;
        self.summaries(&ids).await
    }

    pub async fn following(&self, user: UserId) -> Result<Vec<UserSummary>> {
        self.require_user(user).await?;
        let ids = self.store.following_ids(user).await?;
        self.summaries(&ids).await
    }

    async fn require_user(&self, user: UserId) -> Result<User> {
        self.store
            .fetch_user(user)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Summaries of `ids` in the order given.
    pub(crate) async fn summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        summaries_in_order(&self.store, ids).await
    }
}

pub(crate) async fn summaries_in_order(
    store: &SharedStore,
    ids: &[UserId],
) -> Result<Vec<UserSummary>> {
    let users: HashMap<UserId, User> = store
        .fetch_users(ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    Ok(ids
        .iter()
        .filter_map(|id| users.get(id))
        .map(User::summary)
        .collect())
}

/// Summaries of `ids` keyed by user, for annotating rows that embed a user.
pub(crate) async fn summaries_by_id(
    store: &SharedStore,
    ids: &[UserId],
) -> Result<HashMap<UserId, UserSummary>> {
    Ok(store
        .fetch_users(ids)
        .await?
        .iter()
        .map(|user| (user.id, user.summary()))
        .collect())
}
