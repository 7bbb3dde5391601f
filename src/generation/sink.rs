//! Destinations for generated images.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::GeneratedImage;
use crate::Result;

/// Where generated images get written.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Store the image at `path` and return where it ended up.
    async fn write_image(&self, path: &Path, image: &GeneratedImage) -> Result<PathBuf>;
}

/// Writes decoded image bytes to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSink;

#[async_trait]
impl ImageSink for FsImageSink {
    async fn write_image(&self, path: &Path, image: &GeneratedImage) -> Result<PathBuf> {
        let bytes = image.decode()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Image written");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages").join("cat.png");
        let image = GeneratedImage {
            base64: "iVBORw0KGgo=".to_string(),
            mime_type: "image/png".to_string(),
        };

        let written = FsImageSink.write_image(&path, &image).await.unwrap();

        assert_eq!(written, path);
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let image = GeneratedImage {
            base64: "%%%".to_string(),
            mime_type: "image/png".to_string(),
        };

        assert!(FsImageSink.write_image(&path, &image).await.is_err());
        assert!(!path.exists());
    }
}
