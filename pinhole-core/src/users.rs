use crate::{
    error::{Result, ServiceError},
    media::{SharedMediaStore, Upload},
};
use pinhole_common::{
    model::{
        post::MediaKind,
        user::{USER_BIO_MAX_LEN, UpdateUser, User, UserId},
    },
    pagination::Window,
};
use pinhole_db::{
    SharedStore,
    store::{PostFilter, PostOrder, PostQuery},
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct UserService {
    store: SharedStore,
    media: SharedMediaStore,
}

impl UserService {
    #[must_use]
    pub fn new(store: SharedStore, media: SharedMediaStore) -> Self {
        Self { store, media }
    }

    pub async fn fetch(&self, user: UserId) -> Result<User> {
        self.store
            .fetch_user(user)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Applies the given fields. A new profile picture replaces the stored
    /// one, which is then deleted.
    pub async fn update_profile(
        &self,
        actor: UserId,
        update: UpdateUser,
        profile_pic: Option<Upload>,
    ) -> Result<User> {
        let name = update.name.map(|name| name.trim().to_owned());
        if name.as_ref().is_some_and(String::is_empty) {
            return Err(ServiceError::invalid_input("The name must not be empty"));
        }
        let bio = update.bio.map(|bio| bio.trim().to_owned());
        if bio
            .as_ref()
            .is_some_and(|bio| bio.chars().count() > USER_BIO_MAX_LEN)
        {
            return Err(ServiceError::invalid_input(
                "The bio exceeds 150 characters",
            ));
        }
        if let Some(upload) = profile_pic
            .as_ref()
            .filter(|upload| upload.media_kind() != Some(MediaKind::Image))
        {
            return Err(ServiceError::invalid_input(format!(
                "Unsupported profile picture type {}",
                upload.content_type
            )));
        }

        let (previous, stored) = match &profile_pic {
            Some(upload) => {
                let previous = self.fetch(actor).await?.profile_pic;
                (Some(previous), Some(self.media.store(upload).await?))
            }
            None => (None, None),
        };

        let update = UpdateUser {
            name,
            bio,
            is_private: update.is_private,
            profile_pic: stored.clone(),
        };
        let updated = match self.store.update_user(actor, &update).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.discard_picture(stored.as_deref()).await;
                return Err(ServiceError::NotFound("User"));
            }
            Err(error) => {
                self.discard_picture(stored.as_deref()).await;
                return Err(error.into());
            }
        };

        if stored.is_some() {
            info!(user = %actor, "Replaced profile picture");
            self.discard_picture(previous.as_deref()).await;
        }
        Ok(updated)
    }

    /// Deletes the account with everything attached to it, then the
    /// profile picture and the media of the user's posts.
    pub async fn delete(&self, actor: UserId) -> Result<()> {
        let user = self.fetch(actor).await?;
        let posts = self
            .store
            .fetch_posts(
                &PostQuery {
                    filter: PostFilter {
                        created_by: Some(actor),
                        include_archived: true,
                        ..PostFilter::default()
                    },
                    order: PostOrder::Newest,
                },
                Window {
                    offset: 0,
                    limit: u64::MAX,
                },
            )
            .await?;

        if !self.store.delete_user(actor).await? {
            return Err(ServiceError::NotFound("User"));
        }
        info!(user = %actor, posts = posts.len(), "Deleted user");

        self.discard_picture(Some(&user.profile_pic)).await;
        for media in posts.iter().flat_map(|post| &post.media) {
            if let Err(error) = self.media.delete(&media.url).await {
                warn!(url = %media.url, %error, "Failed to delete media of deleted user");
            }
        }
        Ok(())
    }

    async fn discard_picture(&self, url: Option<&str>) {
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            return;
        };
        if let Err(error) = self.media.delete(url).await {
            warn!(%url, %error, "Failed to delete profile picture");
        }
    }
}
