use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    query::{PageParams, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinhole_common::{
    model::{message::Message, user::UserId},
    pagination::Page,
};
use pinhole_core::Services;
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(send_message)
        .typed_get(get_conversation)
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NewMessage {
    text: String,
    file_url: String,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/messages/{id}", rejection(ServerError))]
struct ConversationPath {
    id: UserId,
}

async fn send_message(
    ConversationPath { id }: ConversationPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Json(message): Json<NewMessage>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = services
        .messages
        .send(user.user_id(), id, &message.text, &message.file_url)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn get_conversation(
    ConversationPath { id }: ConversationPath,
    State(services): State<Services>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Message>>> {
    let messages = services
        .messages
        .conversation(user.user_id(), id, params.request())
        .await?;

    Ok(Json(messages))
}
