//! ImageClient - prompt in, coloring page out
//!
//! One call, one backend request: validation failures never reach the
//! network, backend failures are classified once, nothing is retried.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::{ImageBackend, ImageRequest};
use super::classify::classify;
use super::prompt::{build_prompt, validate_prompt};
use super::sink::{FsImageSink, ImageSink};
use super::GeneratedImage;
use crate::error::{GenerationError, GenerationErrorCode};
use crate::Result;

/// MIME type assumed when the model does not report one
const DEFAULT_MIME_TYPE: &str = "image/png";

/// Coloring page generator.
pub struct ImageClient {
    backend: Arc<dyn ImageBackend>,
    sink: Arc<dyn ImageSink>,
}

impl ImageClient {
    pub fn new(backend: Arc<dyn ImageBackend>) -> Self {
        Self {
            backend,
            sink: Arc::new(FsImageSink),
        }
    }

    /// Replace the filesystem sink used by [`Self::write_image`]
    pub fn with_sink(mut self, sink: Arc<dyn ImageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Generate one coloring page for `prompt`.
    pub async fn generate_image(&self, prompt: &str, access_token: &str) -> Result<GeneratedImage> {
        let description = validate_prompt(prompt)?;
        if access_token.trim().is_empty() {
            return Err(GenerationError::new(
                GenerationErrorCode::NoAuth,
                "Not signed in, an access token is required",
            )
            .into());
        }

        let request = ImageRequest::coloring_page(build_prompt(description));
        info!(
            backend = self.backend.name(),
            chars = description.chars().count(),
            "Generating coloring page"
        );

        let images = self
            .backend
            .generate(access_token, &request)
            .await
            .map_err(|e| {
                warn!("Image generation failed: {}", e);
                classify(e)
            })?;

        let first = images.into_iter().next().ok_or_else(|| {
            GenerationError::new(GenerationErrorCode::GenerationFailed, "No image was returned")
        })?;

        match first.bytes_base64 {
            Some(base64) if STANDARD.decode(&base64).is_ok() => {
                let mime_type = first
                    .mime_type
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                debug!(mime_type = %mime_type, "Image received");
                Ok(GeneratedImage { base64, mime_type })
            }
            None if first.filtered_reason.is_some() => {
                let reason = first.filtered_reason.unwrap_or_default();
                Err(GenerationError::new(
                    GenerationErrorCode::InvalidPromptContent,
                    format!("The image was withheld: {}", reason),
                )
                .into())
            }
            _ => Err(GenerationError::new(
                GenerationErrorCode::GenerationFailed,
                "Invalid image data format",
            )
            .into()),
        }
    }

    /// Like [`Self::generate_image`], formatted as a `data:` URI.
    pub async fn generate_image_data_uri(&self, prompt: &str, access_token: &str) -> Result<String> {
        Ok(self.generate_image(prompt, access_token).await?.data_uri())
    }

    /// Like [`Self::generate_image`], written to `path` through the sink.
    pub async fn generate_image_to_file(
        &self,
        prompt: &str,
        access_token: &str,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let image = self.generate_image(prompt, access_token).await?;
        self.write_image(path.as_ref(), &image).await
    }

    /// Write an already generated image through the sink.
    pub async fn write_image(&self, path: &Path, image: &GeneratedImage) -> Result<PathBuf> {
        self.sink.write_image(path, image).await
    }

    /// Best-effort readiness check; never fails.
    pub async fn check_health(&self, access_token: &str) -> bool {
        match self.backend.check(access_token).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }
}
