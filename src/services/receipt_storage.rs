use crate::config::StorageConfig;
use crate::error::AppResult;
use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

/// Receipt images on local disk, addressed as `<user_id>/<millis>-<uuid>.<ext>`.
#[derive(Clone)]
pub struct ReceiptStorage {
    root: PathBuf,
    public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct StoredReceipt {
    pub key: String,
    pub public_url: String,
}

impl ReceiptStorage {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&cfg.receipts_dir),
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn save(&self, user_id: i64, bytes: &[u8], ext: &str) -> AppResult<StoredReceipt> {
        let key = format!(
            "{}/{}-{}.{}",
            user_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            ext
        );
        let path = self.root.join(&key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        log::debug!("Stored receipt at {}", path.display());
        Ok(StoredReceipt {
            public_url: format!("{}/{}", self.public_base_url, key),
            key,
        })
    }

    /// Deletes a stored receipt. A missing file is not an error.
    pub async fn remove(&self, key: &str) {
        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::debug!("Removed receipt {}", path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!("Could not remove receipt {}: {err}", path.display()),
        }
    }
}
