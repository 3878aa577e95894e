use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    multipart::Form,
    query::{PageParams, Query},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::{
    extract::WithRejection,
    routing::{RouterExt, TypedPath},
};
use pinhole_common::model::user::{UpdateUser, User, UserId, UserSummary};
use pinhole_core::{ServiceError, Services, feed::Profile, graph::FollowOutcome};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_me)
        .typed_put(update_me)
        .typed_delete(delete_me)
        .typed_get(get_profile)
        .typed_put(toggle_follow)
        .typed_get(get_followers)
        .typed_get(get_following)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/me", rejection(ServerError))]
struct MePath();

async fn get_me(
    MePath(): MePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<Json<User>> {
    let user = services.users.fetch(user.user_id()).await?;

    Ok(Json(user))
}

/// Multipart: optional `name`, `bio` and `isPrivate` text fields and an
/// optional `profilePic` file.
async fn update_me(
    MePath(): MePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    WithRejection(multipart, _): WithRejection<Multipart, ServerError>,
) -> Result<Json<User>> {
    let mut form = Form::read(multipart).await?;
    let profile_pic = form.take_files(&["profilePic"]).into_iter().next();
    let is_private = form.field("isPrivate").map(parse_flag).transpose()?;
    let update = UpdateUser {
        name: form.field("name").map(str::to_owned),
        bio: form.field("bio").map(str::to_owned),
        is_private,
        profile_pic: None,
    };

    let user = services
        .users
        .update_profile(user.user_id(), update, profile_pic)
        .await?;

    Ok(Json(user))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ServiceError::invalid_input("isPrivate must be true or false").into()),
    }
}

async fn delete_me(
    MePath(): MePath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.users.delete(user.user_id()).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}", rejection(ServerError))]
struct UserPath {
    id: UserId,
}

async fn get_profile(
    UserPath { id }: UserPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Profile>> {
    let profile = services
        .feed
        .profile(user.user_id(), id, params.request())
        .await?;

    Ok(Json(profile))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/follow", rejection(ServerError))]
struct FollowPath {
    id: UserId,
}

async fn toggle_follow(
    FollowPath { id }: FollowPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<Json<FollowOutcome>> {
    let outcome = services.graph.toggle_follow(user.user_id(), id).await?;

    Ok(Json(outcome))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/followers", rejection(ServerError))]
struct FollowersPath {
    id: UserId,
}

async fn get_followers(
    FollowersPath { id }: FollowersPath,
    State(services): State<Services>,
    _: AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>> {
    let followers = services.graph.followers(id).await?;

    Ok(Json(followers))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/following", rejection(ServerError))]
struct FollowingPath {
    id: UserId,
}

async fn get_following(
    FollowingPath { id }: FollowingPath,
    State(services): State<Services>,
    _: AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>> {
    let following = services.graph.following(id).await?;

    Ok(Json(following))
}
