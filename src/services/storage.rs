use crate::{
    config::Config,
    error::{AppError, Result},
};
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// Blob store for post images and avatars: `store` returns a public URL,
/// `delete_by_url` extracts the key back out of it. Backed by a local
/// directory served under `/uploads`. Callers treat deletion failures as
/// non-fatal and keep going (orphaned blobs are an accepted operational
/// cost, not a correctness bug).
#[derive(Clone)]
pub struct StorageService {
    upload_dir: PathBuf,
    public_base_url: String,
}

impl StorageService {
    pub async fn new(config: &Config) -> Result<Self> {
        let upload_dir = PathBuf::from(&config.upload_dir);
        tokio::fs::create_dir_all(&upload_dir).await?;

        Ok(Self {
            upload_dir,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let extension = sanitize_extension(filename);
        let key = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::write(self.upload_dir.join(&key), bytes).await?;

        info!("Stored upload: {} ({} bytes)", key, bytes.len());
        Ok(format!("{}/uploads/{}", self.public_base_url, key))
    }

    /// Remove the object a previously returned URL points at. A URL that was
    /// not produced by this store, or an already-deleted object, is a no-op.
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        let Some(key) = url.split("/uploads/").nth(1) else {
            debug!("Ignoring delete for foreign URL: {}", url);
            return Ok(());
        };

        // The key is a flat generated name; anything else is not ours
        if key.is_empty() || key.contains('/') || key.contains("..") {
            return Err(AppError::bad_request("Invalid storage key"));
        }

        match tokio::fs::remove_file(self.upload_dir.join(key)).await {
            Ok(()) => {
                info!("Deleted upload: {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Upload already gone: {}", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn sanitize_extension(filename: &str) -> String {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or("bin")
        .to_lowercase();

    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        "bin".to_string()
    } else {
        ext
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("photo.PNG"), "png");
        assert_eq!(sanitize_extension("archive.tar.gz"), "gz");
        assert_eq!(sanitize_extension("no-extension"), "bin");
        assert_eq!(sanitize_extension("weird.p/g"), "bin");
        assert_eq!(sanitize_extension("dots..."), "bin");
    }
}
