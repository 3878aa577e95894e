mod common;

use common::harness;
use pinhole_common::{
    model::{message::chat_id, notification::NotificationKind},
    pagination::PageRequest,
};
use pinhole_core::ServiceError;

#[tokio::test]
async fn messaging_yourself_is_rejected() {
    let h = harness();
    let ada = h.user("ada").await;

    let result = h.services.messages.send(ada.id, ada.id, "hi", "").await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;

    let result = h.services.messages.send(ada.id, bob.id, "  ", "").await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn both_participants_see_the_same_conversation() {
    let h = harness();
    let ada = h.user("ada").await;
    let bob = h.user("bob").await;
    let cat = h.user("cat").await;

    let first = h.services.messages.send(ada.id, bob.id, "hi", "").await.unwrap();
    let second = h
        .services
        .messages
        .send(bob.id, ada.id, "", "/media/photo.png")
        .await
        .unwrap();
    h.services.messages.send(ada.id, cat.id, "elsewhere", "").await.unwrap();
    assert_eq!(first.chat_id, chat_id(bob.id, ada.id));

    let from_ada = h
        .services
        .messages
        .conversation(ada.id, bob.id, PageRequest::default())
        .await
        .unwrap();
    let from_bob = h
        .services
        .messages
        .conversation(bob.id, ada.id, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(from_ada, from_bob);
    let ids: Vec<_> = from_ada.items.iter().map(|message| message.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let notifications = h.store.notifications_of(bob.id);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Message);
}

#[tokio::test]
async fn messaging_an_unknown_user_is_not_found() {
    let h = harness();
    let ada = h.user("ada").await;

    let result = h.services.messages.send(ada.id, 5_u64.into(), "hi", "").await;
    assert!(matches!(result, Err(ServiceError::NotFound("User"))));
}
