use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Image formats accepted for request photos
const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Public store for request photos. Files are written to `dir` and served
/// under `{public_base_url}/photos/`.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
    max_bytes: usize,
    public_base_url: String,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks size and extension, returning the normalized extension
    pub fn validate(&self, file_name: Option<&str>, size: usize) -> AppResult<String> {
        if size == 0 {
            return Err(AppError::BadRequest("Photo is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "Photo is too large ({size} bytes, limit {} bytes)",
                self.max_bytes
            )));
        }

        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| AppError::BadRequest("Photo has no file extension".to_string()))?;

        if !SUPPORTED_FORMATS.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unsupported photo format: {extension}. Supported: {}",
                SUPPORTED_FORMATS.join(", ")
            )));
        }

        Ok(extension)
    }

    /// Stores a photo taken at a table and returns its public URL
    pub async fn save(
        &self,
        table_id: Uuid,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<String> {
        let extension = self.validate(file_name, bytes.len())?;
        let stored_name = format!("{table_id}-{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored_name), bytes).await?;

        log::info!("Stored photo {stored_name} ({} bytes)", bytes.len());
        Ok(self.public_url(&stored_name))
    }

    pub fn public_url(&self, stored_name: &str) -> String {
        format!("{}/photos/{stored_name}", self.public_base_url)
    }

    /// Removes a stored photo by its public URL. URLs outside this store are
    /// left alone; failures are only logged.
    pub async fn discard(&self, url: &str) {
        let prefix = self.public_url("");
        let Some(stored_name) = url
            .strip_prefix(&prefix)
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']))
        else {
            return;
        };

        match tokio::fs::remove_file(self.dir.join(stored_name)).await {
            Ok(()) => log::info!("Discarded photo {stored_name}"),
            Err(e) => log::warn!("Failed to discard photo {stored_name}: {e}"),
        }
    }
}
