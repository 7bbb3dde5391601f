//! Image backend abstraction.
//!
//! [`ImageBackend`] is the seam to the hosted model; [`super::ImagenBackend`]
//! talks to Imagen over REST.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Coloring pages are portrait phone-screen shaped
pub const ASPECT_RATIO: &str = "9:16";

/// One generation request as the model sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    pub number_of_images: u32,
    pub aspect_ratio: String,
}

impl ImageRequest {
    /// Single portrait image for an already-templated prompt
    pub fn coloring_page(prompt: String) -> Self {
        Self {
            prompt,
            number_of_images: 1,
            aspect_ratio: ASPECT_RATIO.to_string(),
        }
    }
}

/// One element of the model's image list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes_base64: Option<String>,
    pub mime_type: Option<String>,
    /// Set when the image was withheld by a safety filter
    pub filtered_reason: Option<String>,
}

/// Raw backend failures, classified by [`super::classify`]
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// Google RPC status, e.g. `RESOURCE_EXHAUSTED`
        code: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{0}")]
    Format(String),

    #[error("Image backend failed without an error message")]
    Unknown,
}

/// Image generation backend trait.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Build a model handle for this credential without calling the model.
    async fn check(&self, access_token: &str) -> Result<(), BackendError>;

    /// Issue exactly one generation request.
    async fn generate(
        &self,
        access_token: &str,
        request: &ImageRequest,
    ) -> Result<Vec<ImagePayload>, BackendError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Scripted backend for tests.
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeBackend {
        pub responses: Mutex<VecDeque<Result<Vec<ImagePayload>, BackendError>>>,
        pub requests: Mutex<Vec<(String, ImageRequest)>>,
        pub check_error: Mutex<Option<BackendError>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Backend that answers once with a PNG payload
        pub fn with_png(base64: &str) -> Self {
            let backend = Self::new();
            backend.push(Ok(vec![ImagePayload {
                bytes_base64: Some(base64.to_string()),
                mime_type: Some("image/png".to_string()),
                filtered_reason: None,
            }]));
            backend
        }

        pub fn push(&self, response: Result<Vec<ImagePayload>, BackendError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> Option<ImageRequest> {
            self.requests.lock().unwrap().last().map(|(_, r)| r.clone())
        }
    }

    #[async_trait]
    impl ImageBackend for FakeBackend {
        async fn check(&self, _access_token: &str) -> Result<(), BackendError> {
            match self.check_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn generate(
            &self,
            access_token: &str,
            request: &ImageRequest,
        ) -> Result<Vec<ImagePayload>, BackendError> {
            self.requests
                .lock()
                .unwrap()
                .push((access_token.to_string(), request.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(BackendError::Unknown))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }
}
