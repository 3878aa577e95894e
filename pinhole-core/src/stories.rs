use crate::{
    error::{Result, ServiceError},
    graph::summaries_by_id,
    hooks::{PostCommitHooks, SocialEvent},
    media::{SharedMediaStore, Upload},
};
use pinhole_common::model::{
    post::{Media, validate_caption},
    story::{CreateStory, Story, StoryId, story_cutoff},
    user::{UserId, UserSummary},
};
use pinhole_db::SharedStore;
use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    #[serde(flatten)]
    pub story: Story,
    pub creator: Option<UserSummary>,
    pub viewer_count: u64,
}

#[derive(Clone)]
pub struct StoryService {
    store: SharedStore,
    media: SharedMediaStore,
    hooks: Arc<PostCommitHooks>,
}

impl StoryService {
    #[must_use]
    pub fn new(store: SharedStore, media: SharedMediaStore, hooks: Arc<PostCommitHooks>) -> Self {
        Self {
            store,
            media,
            hooks,
        }
    }

    pub async fn create(
        &self,
        actor: UserId,
        upload: Upload,
        caption: &str,
        music: Option<Upload>,
    ) -> Result<Story> {
        let kind = upload
            .media_kind()
            .ok_or_else(|| ServiceError::invalid_input("Image or video is required"))?;
        let caption = validate_caption(caption)?;

        let url = self.media.store(&upload).await?;
        let music = match &music {
            Some(music) => Some(self.media.store(music).await?),
            None => None,
        };

        let story = self
            .store
            .create_story(
                actor,
                &CreateStory {
                    media: Media { url, kind },
                    caption,
                    music,
                },
            )
            .await?;

        self.hooks
            .dispatch(&SocialEvent::StoryCreated {
                actor,
                story: story.id,
            })
            .await;
        Ok(story)
    }

    /// Live stories, newest first. Expired stories are purged on the way.
    pub async fn list(&self) -> Result<Vec<StoryView>> {
        let cutoff = story_cutoff(OffsetDateTime::now_utc());
        let purged = self.store.purge_stories(cutoff).await?;
        if purged > 0 {
            debug!(purged, "Purged expired stories");
        }

        let stories = self.store.fetch_stories(cutoff).await?;
        let mut creator_ids: Vec<UserId> = stories.iter().map(|story| story.created_by).collect();
        creator_ids.sort_unstable();
        creator_ids.dedup();
        let creators = summaries_by_id(&self.store, &creator_ids).await?;

        Ok(stories
            .into_iter()
            .map(|story| StoryView {
                creator: creators.get(&story.created_by).cloned(),
                viewer_count: story.viewers.len() as u64,
                story,
            })
            .collect())
    }

    /// Records a view. Returns whether this was the viewer's first; a first
    /// view by anyone but the creator notifies the creator.
    pub async fn view(&self, actor: UserId, story_id: StoryId) -> Result<bool> {
        let story = self.live_story(story_id).await?;
        let first_view = self.store.add_story_viewer(story_id, actor).await?;

        if first_view && story.created_by != actor {
            self.hooks
                .dispatch(&SocialEvent::StoryViewed {
                    viewer: actor,
                    story: story_id,
                    creator: story.created_by,
                })
                .await;
        }
        Ok(first_view)
    }

    pub async fn delete(&self, actor: UserId, story_id: StoryId) -> Result<()> {
        let story = self.live_story(story_id).await?;
        if story.created_by != actor {
            return Err(ServiceError::Forbidden("Not authorized to delete this story"));
        }

        if !self.store.delete_story(story_id).await? {
            return Err(ServiceError::NotFound("Story"));
        }

        let urls = std::iter::once(&story.media.url).chain(story.music.as_ref());
        for url in urls {
            if let Err(error) = self.media.delete(url).await {
                warn!(%url, %error, "Failed to delete media of deleted story");
            }
        }
        Ok(())
    }

    async fn live_story(&self, story_id: StoryId) -> Result<Story> {
        let now = OffsetDateTime::now_utc();
        self.store
            .fetch_story(story_id)
            .await?
            .filter(|story| !story.is_expired(now))
            .ok_or(ServiceError::NotFound("Story"))
    }
}
