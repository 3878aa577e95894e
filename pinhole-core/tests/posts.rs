mod common;

use common::{harness, upload};
use pinhole_common::{
    model::{
        interaction::InteractionKind,
        post::{MediaKind, UpdatePost},
    },
    pagination::PageRequest,
};
use pinhole_core::ServiceError;
use pinhole_db::store::{CommentStore, InteractionStore, PostStore};

#[tokio::test]
async fn create_stores_every_upload_in_order() {
    let h = harness();
    let ada = h.user("ada").await;

    let post = h
        .services
        .posts
        .create(
            ada.id,
            vec![upload("image/png"), upload("video/mp4")],
            "  sunset  ",
            vec!["Beach".to_owned(), "beach".to_owned()],
        )
        .await
        .unwrap();

    let kinds: Vec<_> = post.media.iter().map(|media| media.kind).collect();
    assert_eq!(kinds, vec![MediaKind::Image, MediaKind::Video]);
    assert_eq!(post.media[0].url, "/media/0.png");
    assert_eq!(post.caption, "sunset");
    assert_eq!(post.comment_count, 0);
}

#[tokio::test]
async fn unsupported_uploads_are_rejected_before_storing() {
    let h = harness();
    let ada = h.user("ada").await;
    h.store.reset_calls();

    let result = h
        .services
        .posts
        .create(
            ada.id,
            vec![upload("image/png"), upload("text/plain")],
            "",
            Vec::new(),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));

    let empty = h.services.posts.create(ada.id, Vec::new(), "", Vec::new()).await;
    assert!(matches!(empty, Err(ServiceError::InvalidInput(_))));
    assert_eq!(h.store.total_calls(), 0);
}

#[tokio::test]
async fn only_the_creator_updates_or_deletes() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let post = h
        .services
        .posts
        .create(ada.id, vec![upload("image/png")], "", Vec::new())
        .await
        .unwrap();

    let update = UpdatePost {
        is_archived: Some(true),
        ..UpdatePost::default()
    };
    let result = h.services.posts.update(bob.id, post.id, update.clone()).await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    let result = h.services.posts.delete(bob.id, post.id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    let archived = h.services.posts.update(ada.id, post.id, update).await.unwrap();
    assert!(archived.is_archived);
    assert!(h.services.feed.post(bob.id, post.id).await.is_err());
    assert!(h.services.feed.post(ada.id, post.id).await.is_ok());

    h.services.posts.delete(ada.id, post.id).await.unwrap();
    assert_eq!(h.media.deleted(), vec![post.media[0].url.clone()]);
    let gone = h.services.feed.post(ada.id, post.id).await;
    assert!(matches!(gone, Err(ServiceError::NotFound("Post"))));
}

#[tokio::test]
async fn stored_media_is_removed_when_the_post_insert_fails() {
    let h = harness();
    let ada = h.user("ada").await;
    h.store.fail_on("create_post");

    let result = h
        .services
        .posts
        .create(
            ada.id,
            vec![upload("image/png"), upload("video/mp4")],
            "",
            Vec::new(),
        )
        .await;

    assert!(matches!(result, Err(ServiceError::Internal(_))));
    assert_eq!(
        h.media.deleted(),
        vec!["/media/0.png".to_owned(), "/media/1.mp4".to_owned()]
    );
}

#[tokio::test]
async fn deleting_a_post_removes_everything_attached_to_it() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let post = h.image_post(ada.id).await;
    let kept = h.image_post(ada.id).await;

    h.services.engagement.like(bob.id, post.id).await.unwrap();
    h.services.engagement.save(bob.id, post.id).await.unwrap();
    let comment = h
        .services
        .comments
        .create(bob.id, post.id, "lovely", None)
        .await
        .unwrap();
    h.services
        .comments
        .create(ada.id, post.id, "thank you", Some(comment.id))
        .await
        .unwrap();
    h.services.engagement.like(bob.id, kept.id).await.unwrap();
    assert_eq!(h.store.notifications_of(ada.id).len(), 4);

    h.services.posts.delete(ada.id, post.id).await.unwrap();

    for kind in [InteractionKind::Like, InteractionKind::Save, InteractionKind::Comment] {
        let counts = h.store.count_interactions(kind, &[post.id]).await.unwrap();
        assert!(counts.is_empty(), "{kind:?} survived the post");
    }
    assert_eq!(h.store.count_comments(post.id).await.unwrap(), 0);
    assert!(h.store.fetch_comment(comment.id).await.unwrap().is_none());

    let saved = h
        .services
        .feed
        .saved(bob.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(saved.total, 0);

    let remaining = h.store.notifications_of(ada.id);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].post, Some(kept.id));
    let likes = h
        .store
        .count_interactions(InteractionKind::Like, &[kept.id])
        .await
        .unwrap();
    assert_eq!(likes.get(&kept.id), Some(&1));
}

#[tokio::test]
async fn comment_counter_stops_at_zero() {
    let h = harness();
    let ada = h.user("ada").await;
    let post = h.image_post(ada.id).await;

    let first = h
        .services
        .comments
        .create(ada.id, post.id, "one", None)
        .await
        .unwrap();
    let second = h
        .services
        .comments
        .create(ada.id, post.id, "two", None)
        .await
        .unwrap();
    h.services.comments.delete(ada.id, first.id).await.unwrap();
    h.services.comments.delete(ada.id, second.id).await.unwrap();

    let stored = h.store.fetch_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.comment_count, 0);
    assert!(!h.store.delete_comment(first.id).await.unwrap());
    let stored = h.store.fetch_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.comment_count, 0);
}
