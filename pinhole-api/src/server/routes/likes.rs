use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinhole_common::model::post::PostId;
use pinhole_core::{Services, engagement::LikeCount};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(like_post)
        .typed_delete(unlike_post)
        .typed_get(get_like_count)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/likes/{id}", rejection(ServerError))]
struct LikePath {
    id: PostId,
}

async fn like_post(
    LikePath { id }: LikePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<LikeCount>)> {
    services.engagement.like(user.user_id(), id).await?;
    let count = services.engagement.like_count(id).await?;

    Ok((StatusCode::CREATED, Json(count)))
}

async fn unlike_post(
    LikePath { id }: LikePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.engagement.unlike(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/likes/{id}/count", rejection(ServerError))]
struct LikeCountPath {
    id: PostId,
}

async fn get_like_count(
    LikeCountPath { id }: LikeCountPath,
    State(services): State<Services>,
    _: AuthenticatedUser,
) -> Result<Json<LikeCount>> {
    let count = services.engagement.like_count(id).await?;

    Ok(Json(count))
}
