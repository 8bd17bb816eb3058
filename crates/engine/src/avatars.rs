//! Object storage for profile pictures.
//!
//! The engine only needs "store these bytes under this name and give me a
//! public URL"; [`AvatarStore`] is that seam. [`LocalAvatarStore`] keeps the
//! files in a directory that the HTTP server exposes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{EngineError, ResultEngine};

#[async_trait]
pub trait AvatarStore: Send + Sync + std::fmt::Debug {
    /// Stores `bytes` under `filename`, replacing any previous file with the
    /// same name, and returns the public URL.
    async fn put(&self, filename: &str, bytes: &[u8]) -> ResultEngine<String>;
}

/// Keeps only characters that are safe in a file name and an URL path.
pub fn sanitize_filename(filename: &str) -> ResultEngine<String> {
    let name: String = filename
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if name.is_empty() || name.starts_with('.') {
        return Err(EngineError::InvalidField(format!(
            "invalid avatar filename: {filename}"
        )));
    }
    Ok(name)
}

#[derive(Debug, Clone)]
pub struct LocalAvatarStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAvatarStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for LocalAvatarStore {
    fn default() -> Self {
        Self::new("avatars", "/avatars")
    }
}

#[async_trait]
impl AvatarStore for LocalAvatarStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> ResultEngine<String> {
        let name = sanitize_filename(filename)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), bytes).await?;
        tracing::debug!("stored avatar {name} ({} bytes)", bytes.len());
        Ok(format!("{}/{}", self.public_base_url, name))
    }
}
