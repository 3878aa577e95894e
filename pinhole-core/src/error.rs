use crate::media::MediaError;
use pinhole_common::model::{
    ModelValidationError, comment::InvalidCommentTextError,
    post::{InvalidCaptionError, InvalidMediaError},
};
use pinhole_db::DbError;
use thiserror::Error;

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Storing media failed: {0}")]
    Media(#[from] MediaError),
    #[error("Database error: {0}")]
    Internal(DbError),
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::UniqueViolation(constraint) => {
                ServiceError::Conflict(format!("Already exists ({constraint})"))
            }
            other => ServiceError::Internal(other),
        }
    }
}

impl From<ModelValidationError> for ServiceError {
    fn from(value: ModelValidationError) -> Self {
        ServiceError::InvalidInput(value.to_string())
    }
}

impl From<InvalidCaptionError> for ServiceError {
    fn from(value: InvalidCaptionError) -> Self {
        ServiceError::InvalidInput(value.to_string())
    }
}

impl From<InvalidMediaError> for ServiceError {
    fn from(value: InvalidMediaError) -> Self {
        ServiceError::InvalidInput(value.to_string())
    }
}

impl From<InvalidCommentTextError> for ServiceError {
    fn from(value: InvalidCommentTextError) -> Self {
        ServiceError::InvalidInput(value.to_string())
    }
}
