mod common;

use common::{harness, upload};
use pinhole_common::model::{
    notification::NotificationKind,
    post::{Media, MediaKind},
    story::CreateStory,
};
use pinhole_core::ServiceError;
use time::{Duration, OffsetDateTime};

fn story_at(url: &str) -> CreateStory {
    CreateStory {
        media: Media {
            url: url.to_owned(),
            kind: MediaKind::Image,
        },
        caption: String::new(),
        music: None,
    }
}

#[tokio::test]
async fn expired_stories_are_purged_from_the_listing() {
    let h = harness();
    let ada = h.user("ada").await;
    let now = OffsetDateTime::now_utc();
    let fresh = h
        .store
        .insert_story_at(ada.id, &story_at("/fresh"), now - Duration::hours(1));
    let stale = h
        .store
        .insert_story_at(ada.id, &story_at("/stale"), now - Duration::hours(25));

    let stories = h.services.stories.list().await.unwrap();
    let ids: Vec<_> = stories.iter().map(|view| view.story.id).collect();
    assert_eq!(ids, vec![fresh.id]);
    assert_eq!(stories[0].creator.as_ref().unwrap().id, ada.id);

    let view = h.services.stories.view(ada.id, stale.id).await;
    assert!(matches!(view, Err(ServiceError::NotFound("Story"))));
}

#[tokio::test]
async fn viewing_twice_records_one_viewer() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let story = h
        .services
        .stories
        .create(ada.id, upload("image/png"), "hi", None)
        .await
        .unwrap();

    assert!(h.services.stories.view(bob.id, story.id).await.unwrap());
    assert!(!h.services.stories.view(bob.id, story.id).await.unwrap());

    let stories = h.services.stories.list().await.unwrap();
    assert_eq!(stories[0].viewer_count, 1);
    assert_eq!(stories[0].story.viewers, vec![bob.id]);

    let views: Vec<_> = h
        .store
        .notifications_of(ada.id)
        .into_iter()
        .filter(|notification| notification.kind == NotificationKind::StoryView)
        .collect();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].story, Some(story.id));
}

#[tokio::test]
async fn creators_viewing_their_own_story_are_not_notified() {
    let h = harness();
    let ada = h.user("ada").await;
    let story = h
        .services
        .stories
        .create(ada.id, upload("video/mp4"), "", None)
        .await
        .unwrap();

    assert!(h.services.stories.view(ada.id, story.id).await.unwrap());
    assert!(h.store.notifications_of(ada.id).is_empty());
}

#[tokio::test]
async fn new_stories_reach_followers() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    h.follow(bob.id, ada.id).await;

    let story = h
        .services
        .stories
        .create(ada.id, upload("image/jpeg"), "", Some(upload("audio/mpeg")))
        .await
        .unwrap();
    assert!(story.music.is_some());

    let notifications = h.store.notifications_of(bob.id);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Story);
}

#[tokio::test]
async fn stories_need_image_or_video() {
    let h = harness();
    let ada = h.user("ada").await;

    let result = h
        .services
        .stories
        .create(ada.id, upload("application/pdf"), "", None)
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn only_the_creator_deletes_a_story() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let story = h
        .services
        .stories
        .create(ada.id, upload("image/png"), "", None)
        .await
        .unwrap();

    let result = h.services.stories.delete(bob.id, story.id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    h.services.stories.delete(ada.id, story.id).await.unwrap();
    assert!(h.services.stories.list().await.unwrap().is_empty());
    assert_eq!(h.media.deleted(), vec![story.media.url]);
}
