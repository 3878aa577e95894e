use crate::{
    error::{Result, ServiceError},
    graph::summaries_by_id,
    hooks::{PostCommitHooks, SocialEvent},
};
use pinhole_common::{
    model::{
        comment::{Comment, CommentId, CreateComment, validate_comment_text},
        post::PostId,
        user::{UserId, UserSummary},
    },
    pagination::{Page, PageRequest},
};
use pinhole_db::SharedStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserSummary>,
}

#[derive(Clone)]
pub struct CommentService {
    store: SharedStore,
    hooks: Arc<PostCommitHooks>,
}

impl CommentService {
    #[must_use]
    pub fn new(store: SharedStore, hooks: Arc<PostCommitHooks>) -> Self {
        Self { store, hooks }
    }

    pub async fn create(
        &self,
        actor: UserId,
        post_id: PostId,
        text: &str,
        parent_comment: Option<CommentId>,
    ) -> Result<Comment> {
        let text = validate_comment_text(text)?;
        let post = self
            .store
            .fetch_post(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;

        if let Some(parent) = parent_comment {
            let parent = self.store.fetch_comment(parent).await?;
            if parent.is_none_or(|parent| parent.post != post_id) {
                return Err(ServiceError::invalid_input(
                    "The parent comment does not belong to this post",
                ));
            }
        }

        let comment = self
            .store
            .create_comment(&CreateComment {
                post: post_id,
                created_by: actor,
                text,
                parent_comment,
            })
            .await?;

        self.hooks
            .dispatch(&SocialEvent::PostCommented {
                actor,
                post: post_id,
                creator: post.created_by,
                comment: comment.id,
            })
            .await;
        Ok(comment)
    }

    pub async fn update(&self, actor: UserId, comment_id: CommentId, text: &str) -> Result<Comment> {
        let text = validate_comment_text(text)?;
        self.authored(actor, comment_id, "Not authorized to update this comment")
            .await?;

        self.store
            .update_comment(comment_id, &text)
            .await?
            .ok_or(ServiceError::NotFound("Comment"))
    }

    /// Replies survive their parent; the post's counter drops by one.
    pub async fn delete(&self, actor: UserId, comment_id: CommentId) -> Result<()> {
        self.authored(actor, comment_id, "Not authorized to delete this comment")
            .await?;

        if self.store.delete_comment(comment_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Comment"))
        }
    }

    pub async fn list(&self, post_id: PostId, request: PageRequest) -> Result<Page<CommentView>> {
        if self.store.fetch_post(post_id).await?.is_none() {
            return Err(ServiceError::NotFound("Post"));
        }

        let total = self.store.count_comments(post_id).await?;
        let comments = self
            .store
            .fetch_comments(post_id, request.window())
            .await?;

        let mut author_ids: Vec<UserId> = comments.iter().map(|comment| comment.created_by).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors = summaries_by_id(&self.store, &author_ids).await?;

        let views = comments
            .into_iter()
            .map(|comment| CommentView {
                author: authors.get(&comment.created_by).cloned(),
                comment,
            })
            .collect();
        Ok(Page::new(views, request, total))
    }

    async fn authored(
        &self,
        actor: UserId,
        comment_id: CommentId,
        forbidden: &'static str,
    ) -> Result<Comment> {
        let comment = self
            .store
            .fetch_comment(comment_id)
            .await?
            .ok_or(ServiceError::NotFound("Comment"))?;
        if comment.created_by != actor {
            return Err(ServiceError::Forbidden(forbidden));
        }
        Ok(comment)
    }
}
