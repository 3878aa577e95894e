pub mod aggregate;
pub mod comments;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod graph;
pub mod hooks;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod services;
pub mod stories;
pub mod users;

pub use error::{Result, ServiceError};
pub use services::Services;
