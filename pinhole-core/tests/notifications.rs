mod common;

use common::{harness, upload};
use pinhole_common::{model::notification::NotificationKind, pagination::PageRequest};
use pinhole_core::ServiceError;

#[tokio::test]
async fn a_new_post_fans_out_in_one_write() {
    let h = harness();
    let poster = h.user("poster").await;
    let mut followers = Vec::new();
    for handle in ["one", "two", "three"] {
        let follower = h.user(handle).await;
        h.follow(follower.id, poster.id).await;
        followers.push(follower);
    }
    h.store.reset_calls();

    let post = h
        .services
        .posts
        .create(poster.id, vec![upload("image/png")], "hello", Vec::new())
        .await
        .unwrap();

    assert_eq!(h.store.calls("insert_notifications"), 1);
    assert!(h.store.notifications_of(poster.id).is_empty());
    for follower in &followers {
        let notifications = h.store.notifications_of(follower.id);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Post);
        assert_eq!(notifications[0].post, Some(post.id));
        assert_eq!(notifications[0].message, "poster shared a new post");
    }
}

#[tokio::test]
async fn posting_without_followers_writes_nothing() {
    let h = harness();
    let poster = h.user("poster").await;
    h.store.reset_calls();

    h.services
        .posts
        .create(poster.id, vec![upload("image/png")], "", Vec::new())
        .await
        .unwrap();

    assert_eq!(h.store.calls("insert_notifications"), 0);
}

#[tokio::test]
async fn only_the_recipient_may_touch_a_notification() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    h.services.graph.toggle_follow(bob.id, ada.id).await.unwrap();
    let notification = h.store.notifications_of(ada.id).remove(0);

    let result = h.services.notifications.mark_read(bob.id, notification.id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden("Not authorized"))));
    let result = h.services.notifications.delete(bob.id, notification.id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    h.services
        .notifications
        .mark_read(ada.id, notification.id)
        .await
        .unwrap();
    assert!(h.store.notifications_of(ada.id)[0].is_read);

    h.services
        .notifications
        .delete(ada.id, notification.id)
        .await
        .unwrap();
    assert!(h.store.notifications_of(ada.id).is_empty());
}

#[tokio::test]
async fn listing_resolves_actors_and_marks_all_read() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let cat = h.user("cat").await;
    h.services.graph.toggle_follow(bob.id, ada.id).await.unwrap();
    h.services.graph.toggle_follow(cat.id, ada.id).await.unwrap();

    let page = h
        .services
        .notifications
        .list(ada.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let from: Vec<_> = page
        .items
        .iter()
        .map(|view| view.from.as_ref().unwrap().id)
        .collect();
    assert_eq!(from, vec![cat.id, bob.id]);

    let changed = h.services.notifications.mark_all_read(ada.id).await.unwrap();
    assert_eq!(changed, 2);
    assert_eq!(h.services.notifications.mark_all_read(ada.id).await.unwrap(), 0);
}

#[tokio::test]
async fn listed_notifications_name_their_actors_with_one_lookup() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let cyd = h.user("cyd").await;
    let post = h.image_post(ada.id).await;
    h.services.engagement.like(bob.id, post.id).await.unwrap();
    h.services.engagement.like(cyd.id, post.id).await.unwrap();
    h.services.engagement.save(bob.id, post.id).await.unwrap();
    h.store.reset_calls();

    let page = h
        .services
        .notifications
        .list(ada.id, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(h.store.calls("fetch_users"), 1);
    for view in &page.items {
        let from = view.from.as_ref().unwrap();
        assert_eq!(from.id, view.notification.actor);
    }
    let handles: Vec<_> = page
        .items
        .iter()
        .map(|view| view.from.as_ref().unwrap().handle.get())
        .collect();
    assert_eq!(handles.iter().filter(|handle| **handle == "bob").count(), 2);
    assert_eq!(handles.iter().filter(|handle| **handle == "cyd").count(), 1);
}
