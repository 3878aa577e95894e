//! Blob storage for uploaded media. The rest of the crate only ever sees the
//! URL a blob was stored under.

use async_trait::async_trait;
use parking_lot::Mutex;
use pinhole_common::{
    model::{PinholeSnowflakeGenerator, post::MediaKind},
    snowflake::{ProcessId, WorkerId},
};
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use tracing::debug;

pub type SharedMediaStore = Arc<dyn MediaStore>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("The URL {0} does not belong to this media store")]
    ForeignUrl(String),
}

/// One uploaded file as received from a client.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    #[must_use]
    pub fn media_kind(&self) -> Option<MediaKind> {
        MediaKind::from_content_type(&self.content_type)
    }

    /// A short, filesystem safe extension for the stored blob.
    #[must_use]
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension);
        let from_type = self.content_type.split_once('/').map(|(_, subtype)| subtype);

        from_name
            .into_iter()
            .chain(from_type)
            .map(str::to_ascii_lowercase)
            .find(|extension| {
                !extension.is_empty()
                    && extension.len() <= 8
                    && extension.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| "bin".to_owned())
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the upload and returns the URL it can be fetched from.
    async fn store(&self, upload: &Upload) -> Result<String, MediaError>;

    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

/// Writes blobs below a directory that is served under `base_url`.
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
    name_generator: Mutex<PinholeSnowflakeGenerator>,
}

impl LocalMediaStore {
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: &str,
        worker_id: WorkerId,
        process_id: ProcessId,
    ) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            name_generator: Mutex::new(PinholeSnowflakeGenerator::new(worker_id, process_id)),
        }
    }

    fn key_of<'url>(&self, url: &'url str) -> Option<&'url str> {
        url.strip_prefix(&self.base_url)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty() && !key.contains('/') && !key.contains(".."))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, upload: &Upload) -> Result<String, MediaError> {
        let name = self.name_generator.lock().generate();
        let key = format!("{name}.{}", upload.extension());

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&key), &upload.bytes).await?;
        debug!(key, size = upload.bytes.len(), "Stored media");

        Ok(format!("{}/{key}", self.base_url))
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let key = self
            .key_of(url)
            .ok_or_else(|| MediaError::ForeignUrl(url.to_owned()))?;

        match tokio::fs::remove_file(self.root.join(key)).await {
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}
