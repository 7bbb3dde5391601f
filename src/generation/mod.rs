//! Coloring page generation
//!
//! This module provides:
//! - [`ImageClient`] which validates, templates, calls and classifies
//! - [`ImageBackend`] trait with the REST [`ImagenBackend`]
//! - [`ImageSink`] for writing results to disk
//! - Prompt validation and failure classification helpers

mod backend;
mod classify;
mod client;
mod imagen;
mod prompt;
mod sink;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{Error, GenerationError, GenerationErrorCode};
use crate::Result;

pub use backend::{BackendError, ImageBackend, ImagePayload, ImageRequest, ASPECT_RATIO};
pub use classify::{classify, classify_message};
pub use client::ImageClient;
pub use imagen::ImagenBackend;
pub use prompt::{build_prompt, validate_prompt, MAX_PROMPT_CHARS};
pub use sink::{FsImageSink, ImageSink};

/// A generated image as base64 text plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub base64: String,
    pub mime_type: String,
}

impl GeneratedImage {
    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Raw image bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD.decode(&self.base64).map_err(|e| {
            Error::from(
                GenerationError::new(GenerationErrorCode::GenerationFailed, "Invalid image data format")
                    .with_source(e),
            )
        })
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}


#[cfg(test)]
pub(crate) use backend::fake as backend_fake;
