use crate::server::{Result, ServerError};
use axum::extract::Multipart;
use pinhole_core::media::Upload;
use std::collections::HashMap;

/// A fully read multipart form: text fields by name and files in the order
/// they were sent.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Form {
    texts: HashMap<String, String>,
    files: Vec<(String, Upload)>,
}

impl Form {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            let file_name = field.file_name().map(str::to_owned);
            match field.content_type().map(str::to_owned) {
                Some(content_type) if file_name.is_some() || !content_type.starts_with("text/") => {
                    let bytes = field.bytes().await?;
                    form.files.push((
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                _ => {
                    let text = field.text().await?;
                    form.texts.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.field(name).unwrap_or("")
    }

    /// The text field, if it was sent at all.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Removes and returns every file sent under one of `names`.
    pub fn take_files(&mut self, names: &[&str]) -> Vec<Upload> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(name, _)| names.contains(&name.as_str()));
        self.files = kept;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }

    pub fn take_file(&mut self, names: &[&str], field: &'static str) -> Result<Upload> {
        self.take_files(names)
            .into_iter()
            .next()
            .ok_or(ServerError::MissingField(field))
    }
}
