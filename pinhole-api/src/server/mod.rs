use axum::{
    Router,
    extract::{
        DefaultBodyLimit, FromRef, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use pinhole_common::model::auth::{AuthTokenDecodeError, AuthTokenHashError};
use pinhole_core::{Services, ServiceError};
use pinhole_db::{DbError, SharedStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub mod auth;
pub mod json;
mod multipart;
pub mod query;
mod routes;

/// Posts carry up to ten media files.
pub const UPLOAD_BODY_LIMIT: usize = 256 * 1024 * 1024;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub store: SharedStore,
    pub services: Services,
}

impl ServerState {
    #[must_use]
    pub fn new(store: SharedStore, services: Services) -> Self {
        Self { store, services }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes()
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Multipart body rejected: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Multipart body could not be read: {0}")]
    Multipart(#[from] MultipartError),
    #[error("The multipart field {0} is required")]
    MissingField(&'static str),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token could not be decoded: {0}")]
    InvalidAuthToken(#[from] AuthTokenDecodeError),
    #[error("The auth token could not be hashed: {0}")]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::InvalidToken => StatusCode::UNAUTHORIZED,
            ServerError::PathRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::MultipartRejection(_)
            | ServerError::MissingField(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_) => StatusCode::BAD_REQUEST,
            ServerError::Multipart(error) => error.status(),
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::AuthTokenHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Service(error) => match error {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::InvalidInput(_) | ServiceError::Conflict(_) => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::Media(_) | ServiceError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::ServerError;
    use axum::http::StatusCode;
    use pinhole_core::ServiceError;
    use pinhole_db::DbError;

    #[test]
    fn service_errors_map_to_their_status() {
        let cases = [
            (ServiceError::NotFound("Post"), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden("Not authorized"), StatusCode::FORBIDDEN),
            (
                ServiceError::invalid_input("You cannot follow yourself"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Conflict("Post already liked".to_owned()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Internal(DbError::UniqueViolation("users_handle_key".to_owned())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ServerError::from(error).status(), status);
        }
    }

    #[test]
    fn missing_fields_are_client_errors() {
        let error = ServerError::MissingField("media");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "The multipart field media is required");
    }
}
