mod common;

use common::harness;
use pinhole_common::model::notification::NotificationKind;
use pinhole_core::ServiceError;
use pinhole_db::store::GraphStore;

#[tokio::test]
async fn toggle_follow_keeps_both_directions_in_sync() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;

    let outcome = h.services.graph.toggle_follow(ada.id, bob.id).await.unwrap();
    assert!(outcome.followed);
    assert!(h.services.graph.is_following(ada.id, bob.id).await.unwrap());

    let ada_counts = h.store.count_follows(ada.id).await.unwrap();
    let bob_counts = h.store.count_follows(bob.id).await.unwrap();
    assert_eq!(ada_counts.following, 1);
    assert_eq!(bob_counts.followers, 1);
    assert_eq!(
        h.services.graph.followers(bob.id).await.unwrap()[0].id,
        ada.id
    );
    assert_eq!(
        h.services.graph.following(ada.id).await.unwrap()[0].id,
        bob.id
    );

    let outcome = h.services.graph.toggle_follow(ada.id, bob.id).await.unwrap();
    assert!(!outcome.followed);
    assert!(!h.services.graph.is_following(ada.id, bob.id).await.unwrap());
    assert_eq!(h.store.count_follows(bob.id).await.unwrap().followers, 0);
    assert_eq!(h.store.count_follows(ada.id).await.unwrap().following, 0);
}

#[tokio::test]
async fn only_new_follows_notify() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;

    h.services.graph.toggle_follow(ada.id, bob.id).await.unwrap();
    h.services.graph.toggle_follow(ada.id, bob.id).await.unwrap();

    let notifications = h.store.notifications_of(bob.id);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Follow);
    assert_eq!(notifications[0].actor, ada.id);
}

#[tokio::test]
async fn self_follow_is_rejected_before_touching_the_store() {
    let h = harness();
    let ada = h.user("ada").await;
    let hidden = h.private_user("hidden").await;
    h.store.reset_calls();

    for user in [ada.id, hidden.id] {
        let result = h.services.graph.toggle_follow(user, user).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
    assert_eq!(h.store.total_calls(), 0);
}

#[tokio::test]
async fn private_accounts_cannot_be_followed_but_can_be_left() {
    let h = harness();
    let ada = h.user("ada").await;
    let hidden = h.private_user("hidden").await;

    let result = h.services.graph.toggle_follow(ada.id, hidden.id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));

    h.follow(ada.id, hidden.id).await;
    let outcome = h.services.graph.toggle_follow(ada.id, hidden.id).await.unwrap();
    assert!(!outcome.followed);
}

#[tokio::test]
async fn unknown_target_is_not_found() {
    let h = harness();
    let ada = h.user("ada").await;

    let result = h.services.graph.toggle_follow(ada.id, 12_345_u64.into()).await;
    assert!(matches!(result, Err(ServiceError::NotFound("User"))));
}

#[tokio::test]
async fn second_degree_excludes_self_and_direct_follows() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let cat = h.user("cat").await;
    let dan = h.user("dan").await;
    let eve = h.user("eve").await;

    h.follow(ada.id, bob.id).await;
    h.follow(ada.id, cat.id).await;
    h.follow(bob.id, cat.id).await;
    h.follow(bob.id, ada.id).await;
    h.follow(bob.id, dan.id).await;
    h.follow(cat.id, dan.id).await;
    h.follow(dan.id, eve.id).await;

    let suggestions = h.services.graph.second_degree(ada.id).await.unwrap();
    assert_eq!(suggestions, vec![dan.id]);

    let loner = h.user("loner").await;
    assert!(h.services.graph.second_degree(loner.id).await.unwrap().is_empty());
}
