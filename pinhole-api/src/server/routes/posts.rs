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
use pinhole_common::{
    model::post::{Post, PostId, UpdatePost, parse_tag_list},
    pagination::Page,
};
use pinhole_core::{Services, feed::FeedPost};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_feed)
        .typed_post(create_post)
        .typed_get(get_reels)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

async fn get_feed(
    PostsPath(): PostsPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<FeedPost>>> {
    let page = params.request().page();
    let feed = services.feed.global_feed(user.user_id(), page).await?;

    Ok(Json(feed))
}

async fn create_post(
    PostsPath(): PostsPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    WithRejection(multipart, _): WithRejection<Multipart, ServerError>,
) -> Result<(StatusCode, Json<Post>)> {
    let mut form = Form::read(multipart).await?;
    let uploads = form.take_files(&["media", "media[]", "file", "files"]);
    let tags = parse_tag_list(form.text("tags"));

    let post = services
        .posts
        .create(user.user_id(), uploads, form.text("caption"), tags)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/reels", rejection(ServerError))]
struct ReelsPath();

async fn get_reels(
    ReelsPath(): ReelsPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<FeedPost>>> {
    let reels = services
        .feed
        .reels(user.user_id(), params.request())
        .await?;

    Ok(Json(reels))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: PostId,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<Json<FeedPost>> {
    let post = services.feed.post(user.user_id(), id).await?;

    Ok(Json(post))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Json(update): Json<UpdatePost>,
) -> Result<Json<Post>> {
    let post = services.posts.update(user.user_id(), id, update).await?;

    Ok(Json(post))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.posts.delete(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
