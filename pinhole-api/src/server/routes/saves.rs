use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    query::{PageParams, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinhole_common::{model::post::PostId, pagination::Page};
use pinhole_core::{Services, feed::FeedPost};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_saved)
        .typed_post(save_post)
        .typed_delete(unsave_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/saves", rejection(ServerError))]
struct SavesPath();

async fn list_saved(
    SavesPath(): SavesPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<FeedPost>>> {
    let saved = services
        .feed
        .saved(user.user_id(), params.request())
        .await?;

    Ok(Json(saved))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/saves/{id}", rejection(ServerError))]
struct SavePath {
    id: PostId,
}

async fn save_post(
    SavePath { id }: SavePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.engagement.save(user.user_id(), id).await?;

    Ok(StatusCode::CREATED)
}

async fn unsave_post(
    SavePath { id }: SavePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.engagement.unsave(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
