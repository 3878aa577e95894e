use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, multipart::Form,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::{
    extract::WithRejection,
    routing::{RouterExt, TypedPath},
};
use pinhole_common::model::story::{Story, StoryId};
use pinhole_core::{Services, stories::StoryView};
use serde::{Deserialize, Serialize};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_stories)
        .typed_post(create_story)
        .typed_put(view_story)
        .typed_delete(delete_story)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories", rejection(ServerError))]
struct StoriesPath();

async fn list_stories(
    StoriesPath(): StoriesPath,
    State(services): State<Services>,
    _: AuthenticatedUser,
) -> Result<Json<Vec<StoryView>>> {
    let stories = services.stories.list().await?;

    Ok(Json(stories))
}

async fn create_story(
    StoriesPath(): StoriesPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    WithRejection(multipart, _): WithRejection<Multipart, ServerError>,
) -> Result<(StatusCode, Json<Story>)> {
    let mut form = Form::read(multipart).await?;
    let upload = form.take_file(&["image", "video", "media"], "image")?;
    let music = form.take_files(&["music"]).into_iter().next();

    let story = services
        .stories
        .create(user.user_id(), upload, form.text("caption"), music)
        .await?;

    Ok((StatusCode::CREATED, Json(story)))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewOutcome {
    first_view: bool,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories/{id}/view", rejection(ServerError))]
struct ViewStoryPath {
    id: StoryId,
}

async fn view_story(
    ViewStoryPath { id }: ViewStoryPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<Json<ViewOutcome>> {
    let first_view = services.stories.view(user.user_id(), id).await?;

    Ok(Json(ViewOutcome { first_view }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories/{id}", rejection(ServerError))]
struct StoryPath {
    id: StoryId,
}

async fn delete_story(
    StoryPath { id }: StoryPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    services.stories.delete(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
