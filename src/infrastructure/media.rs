// Media storage - uploaded post images on the local filesystem

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Directory under the media root that holds post images.
pub const POST_IMAGE_DIR: &str = "posts";

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex"));

/// An image submitted with a post form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a post image and return its path relative to the media root.
    pub async fn save_post_image(&self, upload: &ImageUpload) -> AppResult<String> {
        let dir = self.root.join(POST_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let mut name = sanitize_file_name(&upload.file_name);
        if tokio::fs::try_exists(dir.join(&name)).await.unwrap_or(false) {
            name = with_suffix(&name, &Uuid::new_v4().simple().to_string()[..7]);
        }

        let path = dir.join(&name);
        tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
            AppError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), size = upload.bytes.len(), "stored post image");
        Ok(format!("{}/{}", POST_IMAGE_DIR, name))
    }

    /// Delete a stored post image by the relative path `save_post_image`
    /// returned. Paths outside the post image directory are refused.
    pub async fn remove_post_image(&self, relative: &str) -> AppResult<()> {
        let Some(name) = relative.strip_prefix(&format!("{}/", POST_IMAGE_DIR)) else {
            return Err(AppError::Storage(format!("Not a post image path: {}", relative)));
        };
        if name.is_empty() || sanitize_file_name(name) != name {
            return Err(AppError::Storage(format!("Not a post image path: {}", relative)));
        }

        let path = self.root.join(POST_IMAGE_DIR).join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "removed post image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Like `remove_post_image`, but failures are only logged.
    pub async fn discard_post_image(&self, relative: &str) {
        if let Err(e) = self.remove_post_image(relative).await {
            warn!(error = %e, "leaving post image behind");
        }
    }
}

/// Keep only the base name and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_NAME_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}
