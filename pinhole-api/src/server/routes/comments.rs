use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    query::{PageParams, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinhole_common::{
    model::{
        comment::{Comment, CommentId},
        post::PostId,
    },
    pagination::Page,
};
use pinhole_core::{Services, comments::CommentView};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_comment)
        .typed_get(list_comments)
        .typed_put(update_comment)
        .typed_delete(delete_comment)
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewComment {
    text: String,
    parent_comment: Option<CommentId>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct EditComment {
    text: String,
}

/// Collection routes take a post id, item routes a comment id. Both share
/// one path so the router sees a single parameter name.
#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}", rejection(ServerError))]
struct PostCommentsPath {
    id: PostId,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}", rejection(ServerError))]
struct CommentPath {
    id: CommentId,
}

async fn create_comment(
    PostCommentsPath { id }: PostCommentsPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Json(comment): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = services
        .comments
        .create(user.user_id(), id, &comment.text, comment.parent_comment)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(services): State<Services>,
    _: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<CommentView>>> {
    let comments = services.comments.list(id, params.request()).await?;

    Ok(Json(comments))
}

async fn update_comment(
    CommentPath { id }: CommentPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Json(edit): Json<EditComment>,
) -> Result<Json<Comment>> {
    let comment = services
        .comments
        .update(user.user_id(), id, &edit.text)
        .await?;

    Ok(Json(comment))
}

async fn delete_comment(
    CommentPath { id }: CommentPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.comments.delete(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
