//! Feed, reels, saved posts and profiles.
//!
//! Every listing runs the same pipeline: count and fetch one window of posts
//! through a [`PostQuery`], then annotate the window with creators, the
//! viewer's follow state and interaction summaries. Annotation costs a fixed
//! number of store calls per window.

use crate::{
    aggregate::InteractionAggregator,
    error::{Result, ServiceError},
    graph::{SocialGraph, summaries_in_order},
};
use pinhole_common::{
    model::{
        interaction::InteractionSummary,
        post::{Post, PostId},
        user::{User, UserId, UserSummary},
    },
    pagination::{DEFAULT_PAGE_LIMIT, Page, PageRequest},
};
use pinhole_db::{SharedStore, store::PostQuery};
use serde::Serialize;
use std::collections::HashMap;

/// A post as shown in a listing.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub creator: Option<UserSummary>,
    pub interactions: InteractionSummary,
    pub is_following_creator: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: User,
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
    pub is_following: bool,
    pub posts: Page<FeedPost>,
    pub saved_posts: Page<FeedPost>,
    pub suggested_users: Vec<UserSummary>,
}

#[derive(Clone)]
pub struct FeedComposer {
    store: SharedStore,
    aggregator: InteractionAggregator,
    graph: SocialGraph,
}

impl FeedComposer {
    #[must_use]
    pub fn new(store: SharedStore, graph: SocialGraph) -> Self {
        Self {
            aggregator: InteractionAggregator::new(store.clone()),
            store,
            graph,
        }
    }

    /// Every live post, newest first, ten per page.
    pub async fn global_feed(&self, viewer: UserId, page: u32) -> Result<Page<FeedPost>> {
        let request = PageRequest::new(page, DEFAULT_PAGE_LIMIT);
        self.list(&PostQuery::feed(), request, viewer).await
    }

    /// Live video posts, creators the viewer follows first.
    pub async fn reels(&self, viewer: UserId, request: PageRequest) -> Result<Page<FeedPost>> {
        self.list(&PostQuery::reels(viewer), request, viewer).await
    }

    /// Posts the viewer saved.
    pub async fn saved(&self, viewer: UserId, request: PageRequest) -> Result<Page<FeedPost>> {
        self.list(&PostQuery::saved_by(viewer), request, viewer).await
    }

    pub async fn profile(
        &self,
        viewer: UserId,
        target: UserId,
        request: PageRequest,
    ) -> Result<Profile> {
        let user = self
            .store
            .fetch_user(target)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let created_query = PostQuery::created_by(target);
        let saved_query = PostQuery::saved_by(target);
        let (counts, is_following, posts, saved_posts, suggestions) = tokio::try_join!(
            async { self.store.count_follows(target).await.map_err(ServiceError::from) },
            self.graph.is_following(viewer, target),
            self.list(&created_query, request, viewer),
            self.list(&saved_query, request, viewer),
            self.graph.second_degree(target),
        )?;
        let suggested_users = summaries_in_order(&self.store, &suggestions).await?;

        Ok(Profile {
            user,
            follower_count: counts.followers,
            following_count: counts.following,
            post_count: posts.total,
            is_following,
            posts,
            saved_posts,
            suggested_users,
        })
    }

    /// A single post, annotated. Archived posts are only visible to their
    /// creator.
    pub async fn post(&self, viewer: UserId, post_id: PostId) -> Result<FeedPost> {
        let post = self
            .store
            .fetch_post(post_id)
            .await?
            .filter(|post| !post.is_archived || post.created_by == viewer)
            .ok_or(ServiceError::NotFound("Post"))?;

        let mut annotated = self.annotate(vec![post], viewer).await?;
        annotated.pop().ok_or(ServiceError::NotFound("Post"))
    }

    async fn list(
        &self,
        query: &PostQuery,
        request: PageRequest,
        viewer: UserId,
    ) -> Result<Page<FeedPost>> {
        let (total, posts) = tokio::try_join!(
            self.store.count_posts(query),
            self.store.fetch_posts(query, request.window()),
        )?;
        let annotated = self.annotate(posts, viewer).await?;
        Ok(Page::new(annotated, request, total))
    }

    pub async fn annotate(&self, posts: Vec<Post>, viewer: UserId) -> Result<Vec<FeedPost>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        let mut creator_ids: Vec<UserId> = posts.iter().map(|post| post.created_by).collect();
        creator_ids.sort_unstable();
        creator_ids.dedup();

        let (summaries, creators, followed) = tokio::try_join!(
            self.aggregator.summarize(&post_ids, viewer),
            async { self.store.fetch_users(&creator_ids).await.map_err(ServiceError::from) },
            async {
                self.store
                    .followed_among(viewer, &creator_ids)
                    .await
                    .map_err(ServiceError::from)
            },
        )?;
        let creators: HashMap<UserId, UserSummary> = creators
            .iter()
            .map(|creator| (creator.id, creator.summary()))
            .collect();

        Ok(posts
            .into_iter()
            .zip(summaries)
            .map(|(post, interactions)| FeedPost {
                creator: creators.get(&post.created_by).cloned(),
                is_following_creator: followed.contains(&post.created_by),
                interactions,
                post,
            })
            .collect())
    }
}
