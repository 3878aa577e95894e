use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    query::{PageParams, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinhole_common::{model::notification::NotificationId, pagination::Page};
use pinhole_core::{Services, notifications::NotificationView};
use serde::{Deserialize, Serialize};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_notifications)
        .typed_put(mark_all_read)
        .typed_put(mark_read)
        .typed_delete(delete_notification)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications", rejection(ServerError))]
struct NotificationsPath();

async fn list_notifications(
    NotificationsPath(): NotificationsPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<NotificationView>>> {
    let notifications = services
        .notifications
        .list(user.user_id(), params.request())
        .await?;

    Ok(Json(notifications))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct MarkedRead {
    updated: u64,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications/read-all", rejection(ServerError))]
struct ReadAllPath();

async fn mark_all_read(
    ReadAllPath(): ReadAllPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<Json<MarkedRead>> {
    let updated = services.notifications.mark_all_read(user.user_id()).await?;

    Ok(Json(MarkedRead { updated }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications/{id}/read", rejection(ServerError))]
struct ReadPath {
    id: NotificationId,
}

async fn mark_read(
    ReadPath { id }: ReadPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.notifications.mark_read(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications/{id}", rejection(ServerError))]
struct NotificationPath {
    id: NotificationId,
}

async fn delete_notification(
    NotificationPath { id }: NotificationPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.notifications.delete(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
