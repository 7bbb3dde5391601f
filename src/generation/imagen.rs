//! Imagen client over the Generative Language REST API (OAuth bearer auth).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::backend::{BackendError, ImageBackend, ImagePayload, ImageRequest};

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Resolved model endpoint bound to a credential
struct ModelHandle<'a> {
    url: Url,
    access_token: &'a str,
}

/// Imagen `:predict` client.
#[derive(Clone)]
pub struct ImagenBackend {
    api_base: String,
    model: String,
    project_id: Option<String>,
    client: Client,
}

impl ImagenBackend {
    pub fn new(api_base: &str, model: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            project_id: None,
            client: Client::new(),
        }
    }

    /// Bill requests to this project (`x-goog-user-project`)
    pub fn with_project(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id;
        self
    }

    fn model_handle<'a>(&self, access_token: &'a str) -> Result<ModelHandle<'a>, BackendError> {
        if access_token.trim().is_empty() {
            return Err(BackendError::Api {
                status: 401,
                code: Some("UNAUTHENTICATED".to_string()),
                message: "Missing access token".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(BackendError::Format("No Imagen model configured".to_string()));
        }

        let url = Url::parse(&format!("{}/models/{}:predict", self.api_base, self.model))
            .map_err(|e| BackendError::Format(format!("Invalid model URL: {}", e)))?;
        Ok(ModelHandle { url, access_token })
    }
}

#[async_trait]
impl ImageBackend for ImagenBackend {
    async fn check(&self, access_token: &str) -> Result<(), BackendError> {
        self.model_handle(access_token).map(|_| ())
    }

    async fn generate(
        &self,
        access_token: &str,
        request: &ImageRequest,
    ) -> Result<Vec<ImagePayload>, BackendError> {
        let handle = self.model_handle(access_token)?;

        let body = json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": {
                "sampleCount": request.number_of_images,
                "aspectRatio": request.aspect_ratio,
                "includeRaiReason": true
            }
        });

        let mut call = self
            .client
            .post(handle.url)
            .bearer_auth(handle.access_token)
            .json(&body);
        if let Some(project) = &self.project_id {
            call = call.header("x-goog-user-project", project);
        }

        let response = call.send().await.map_err(BackendError::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(BackendError::Transport)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Imagen request rejected");
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => BackendError::Api {
                    status: status.as_u16(),
                    code: envelope.error.status,
                    message: envelope.error.message,
                },
                Err(_) => BackendError::Api {
                    status: status.as_u16(),
                    code: None,
                    message: text,
                },
            });
        }

        let parsed: PredictResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::Format(format!("Unexpected Imagen response: {}", e)))?;

        Ok(parsed
            .predictions
            .into_iter()
            .map(|p| ImagePayload {
                bytes_base64: p.bytes_base64_encoded,
                mime_type: p.mime_type,
                filtered_reason: p.rai_filtered_reason,
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "imagen-3.0-generate-002";

    fn request() -> ImageRequest {
        ImageRequest::coloring_page("a smiling cat".to_string())
    }

    #[tokio::test]
    async fn test_check_builds_handle_offline() {
        let backend = ImagenBackend::new("https://generativelanguage.googleapis.com/v1beta/", MODEL);
        assert!(backend.check("ya29.token").await.is_ok());
        assert!(backend.check("").await.is_err());
        assert!(ImagenBackend::new("not a url", MODEL).check("ya29.token").await.is_err());
    }

    #[tokio::test]
    async fn test_predict_request_and_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{MODEL}:predict")))
            .and(header("authorization", "Bearer ya29.token"))
            .and(header("x-goog-user-project", "kids-app"))
            .and(body_json(json!({
                "instances": [{ "prompt": "a smiling cat" }],
                "parameters": { "sampleCount": 1, "aspectRatio": "9:16", "includeRaiReason": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = ImagenBackend::new(&server.uri(), MODEL).with_project(Some("kids-app".into()));
        let images = backend.generate("ya29.token", &request()).await.unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].bytes_base64.as_deref(), Some("iVBORw0KGgo="));
        assert_eq!(images[0].mime_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_filtered_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "raiFilteredReason": "Blocked by safety filter" }]
            })))
            .mount(&server)
            .await;

        let images = ImagenBackend::new(&server.uri(), MODEL)
            .generate("ya29.token", &request())
            .await
            .unwrap();
        assert!(images[0].bytes_base64.is_none());
        assert_eq!(images[0].filtered_reason.as_deref(), Some("Blocked by safety filter"));
    }

    #[tokio::test]
    async fn test_google_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Quota exceeded for quota metric",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        let err = ImagenBackend::new(&server.uri(), MODEL)
            .generate("ya29.token", &request())
            .await
            .unwrap_err();
        match err {
            BackendError::Api { status, code, message } => {
                assert_eq!(status, 429);
                assert_eq!(code.as_deref(), Some("RESOURCE_EXHAUSTED"));
                assert!(message.starts_with("Quota exceeded"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = ImagenBackend::new(&server.uri(), MODEL)
            .generate("ya29.token", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 502, code: None, .. }));
    }

    #[tokio::test]
    async fn test_garbage_body_is_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = ImagenBackend::new(&server.uri(), MODEL)
            .generate("ya29.token", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Format(_)));
    }
}
