use crate::error::Result;
use pinhole_common::model::{
    interaction::{InteractionKind, InteractionSummary},
    post::PostId,
    user::UserId,
};
use pinhole_db::SharedStore;
use std::collections::{HashMap, HashSet};

/// Computes like, comment and save counts plus the viewer's own participation
/// for a batch of posts.
///
/// A batch costs one grouped count and one membership lookup per
/// [`InteractionKind`], regardless of its size.
#[derive(Clone)]
pub struct InteractionAggregator {
    store: SharedStore,
}

struct KindAggregate {
    kind: InteractionKind,
    counts: HashMap<PostId, u64>,
    by_viewer: HashSet<PostId>,
}

impl InteractionAggregator {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn aggregate_kind(
        &self,
        kind: InteractionKind,
        posts: &[PostId],
        viewer: UserId,
    ) -> Result<KindAggregate> {
        let (counts, by_viewer) = tokio::try_join!(
            self.store.count_interactions(kind, posts),
            self.store.interacted_posts(kind, viewer, posts),
        )?;

        Ok(KindAggregate {
            kind,
            counts,
            by_viewer,
        })
    }

    /// Returns one summary per input post, in input order. Posts nobody
    /// interacted with get an all-zero summary.
    pub async fn summarize(
        &self,
        posts: &[PostId],
        viewer: UserId,
    ) -> Result<Vec<InteractionSummary>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let [likes, comments, saves] = InteractionKind::ALL;
        let aggregates = tokio::try_join!(
            self.aggregate_kind(likes, posts, viewer),
            self.aggregate_kind(comments, posts, viewer),
            self.aggregate_kind(saves, posts, viewer),
        )?;
        let aggregates = [aggregates.0, aggregates.1, aggregates.2];

        let summaries = posts
            .iter()
            .map(|post| {
                let mut summary = InteractionSummary::default();
                for aggregate in &aggregates {
                    let count = aggregate.counts.get(post).copied().unwrap_or(0);
                    summary.set_count(aggregate.kind, count);
                    summary.set_by_user(aggregate.kind, aggregate.by_viewer.contains(post));
                }
                summary
            })
            .collect();

        Ok(summaries)
    }
}
