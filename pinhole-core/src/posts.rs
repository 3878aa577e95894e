use crate::{
    error::{Result, ServiceError},
    hooks::{PostCommitHooks, SocialEvent},
    media::{SharedMediaStore, Upload},
};
use pinhole_common::model::{
    post::{
        CreatePost, InvalidMediaError, Media, POST_MEDIA_MAX_COUNT, Post, PostId, UpdatePost,
        validate_caption,
    },
    user::UserId,
};
use pinhole_db::SharedStore;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct PostService {
    store: SharedStore,
    media: SharedMediaStore,
    hooks: Arc<PostCommitHooks>,
}

impl PostService {
    #[must_use]
    pub fn new(store: SharedStore, media: SharedMediaStore, hooks: Arc<PostCommitHooks>) -> Self {
        Self {
            store,
            media,
            hooks,
        }
    }

    /// Validates everything up front, stores the blobs, writes the post and
    /// tells the creator's followers.
    pub async fn create(
        &self,
        actor: UserId,
        uploads: Vec<Upload>,
        caption: &str,
        tags: Vec<String>,
    ) -> Result<Post> {
        if uploads.is_empty() {
            return Err(InvalidMediaError::Empty.into());
        }
        if uploads.len() > POST_MEDIA_MAX_COUNT {
            return Err(InvalidMediaError::TooMany.into());
        }
        validate_caption(caption)?;

        let kinds = uploads
            .iter()
            .map(|upload| {
                upload.media_kind().ok_or_else(|| {
                    ServiceError::invalid_input(format!(
                        "Unsupported media type {}",
                        upload.content_type
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut media = Vec::with_capacity(uploads.len());
        for (upload, kind) in uploads.iter().zip(kinds) {
            match self.media.store(upload).await {
                Ok(url) => media.push(Media { url, kind }),
                Err(error) => {
                    self.discard_media(&media, "unfinished post")
                        .await;
                    return Err(error.into());
                }
            }
        }

        let created: Result<Post> = match CreatePost::new(media.clone(), caption, tags) {
            Ok(create) => self.store.create_post(actor, &create).await.map_err(Into::into),
            Err(error) => Err(error.into()),
        };
        let post = match created {
            Ok(post) => post,
            Err(error) => {
                self.discard_media(&media, "unsaved post")
                    .await;
                return Err(error);
            }
        };
        info!(post = %post.id, creator = %actor, "Created post");

        self.hooks
            .dispatch(&SocialEvent::PostCreated {
                actor,
                post: post.id,
            })
            .await;
        Ok(post)
    }

    pub async fn update(&self, actor: UserId, post_id: PostId, update: UpdatePost) -> Result<Post> {
        self.owned_post(actor, post_id, "Not authorized to update this post")
            .await?;

        let update = UpdatePost {
            caption: update.caption.as_deref().map(validate_caption).transpose()?,
            ..update
        };
        self.store
            .update_post(post_id, &update)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }

    /// Deletes the post together with its comments, likes, saves and
    /// notifications. Stored blobs are removed afterwards on a best effort
    /// basis.
    pub async fn delete(&self, actor: UserId, post_id: PostId) -> Result<()> {
        let post = self
            .owned_post(actor, post_id, "Not authorized to delete this post")
            .await?;

        if !self.store.delete_post(post_id).await? {
            return Err(ServiceError::NotFound("Post"));
        }
        info!(post = %post_id, "Deleted post");

        self.discard_media(&post.media, "deleted post")
            .await;
        Ok(())
    }

    /// Best effort: failures are logged and otherwise ignored.
    async fn discard_media(&self, media: &[Media], reason: &'static str) {
        for media in media {
            if let Err(error) = self.media.delete(&media.url).await {
                warn!(url = %media.url, %error, reason, "Failed to delete media");
            }
        }
    }

    async fn owned_post(
        &self,
        actor: UserId,
        post_id: PostId,
        forbidden: &'static str,
    ) -> Result<Post> {
        let post = self
            .store
            .fetch_post(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        if post.created_by != actor {
            return Err(ServiceError::Forbidden(forbidden));
        }
        Ok(post)
    }
}
