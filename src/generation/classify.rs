//! Maps backend failures onto the stable generation error codes.
//!
//! Structured signals (HTTP status, Google RPC status, transport kind) win.
//! Message wording is only consulted when those say nothing specific.

use super::backend::BackendError;
use crate::error::{GenerationError, GenerationErrorCode};

const AUTH_WORDS: &[&str] = &["auth", "permission", "api key", "credential"];
const CONTENT_WORDS: &[&str] = &["safety", "blocked", "policy", "inappropriate"];
const QUOTA_WORDS: &[&str] = &["quota", "rate limit", "resource exhausted"];
const NETWORK_WORDS: &[&str] = &["network", "fetch", "timeout", "timed out", "connection"];

/// Classify a raw failure message by its wording.
pub fn classify_message(message: &str) -> GenerationErrorCode {
    let message = message.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| message.contains(w));

    if mentions(AUTH_WORDS) {
        GenerationErrorCode::AuthFailed
    } else if mentions(CONTENT_WORDS) {
        GenerationErrorCode::InvalidPromptContent
    } else if mentions(QUOTA_WORDS) {
        GenerationErrorCode::QuotaExceeded
    } else if mentions(NETWORK_WORDS) {
        GenerationErrorCode::NetworkError
    } else {
        GenerationErrorCode::GenerationFailed
    }
}

fn structured_code(err: &BackendError) -> Option<GenerationErrorCode> {
    match err {
        BackendError::Api { status, code, .. } => match (*status, code.as_deref()) {
            (401 | 403, _) | (_, Some("UNAUTHENTICATED" | "PERMISSION_DENIED")) => {
                Some(GenerationErrorCode::AuthFailed)
            }
            (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => Some(GenerationErrorCode::QuotaExceeded),
            _ => None,
        },
        BackendError::Transport(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
            Some(GenerationErrorCode::NetworkError)
        }
        BackendError::Unknown => Some(GenerationErrorCode::UnknownError),
        _ => None,
    }
}

fn user_message(code: GenerationErrorCode) -> &'static str {
    match code {
        GenerationErrorCode::AuthFailed => "Authentication failed, please sign in again",
        GenerationErrorCode::InvalidPromptContent => {
            "This description can't be drawn, please try a different one"
        }
        GenerationErrorCode::QuotaExceeded => "Too many pictures for now, please try again later",
        GenerationErrorCode::NetworkError => "Network error, check your connection",
        GenerationErrorCode::UnknownError => "An unknown error occurred",
        _ => "Failed to generate image",
    }
}

/// Turn a backend failure into a typed generation error carrying it as cause.
pub fn classify(err: BackendError) -> GenerationError {
    let code = structured_code(&err).unwrap_or_else(|| match &err {
        BackendError::Api { message, .. } => classify_message(message),
        other => classify_message(&other.to_string()),
    });

    let message = match &err {
        BackendError::Unknown => user_message(code).to_string(),
        other => format!("{}: {}", user_message(code), other),
    };
    GenerationError::new(code, message).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: Option<&str>, message: &str) -> BackendError {
        BackendError::Api {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_quota_message() {
        assert_eq!(
            classify_message("Quota exceeded for this project"),
            GenerationErrorCode::QuotaExceeded
        );
    }

    #[test]
    fn test_message_fallbacks() {
        assert_eq!(classify_message("API key not valid"), GenerationErrorCode::AuthFailed);
        assert_eq!(
            classify_message("Prompt was blocked by safety settings"),
            GenerationErrorCode::InvalidPromptContent
        );
        assert_eq!(classify_message("Rate limit hit"), GenerationErrorCode::QuotaExceeded);
        assert_eq!(classify_message("TypeError: Failed to fetch"), GenerationErrorCode::NetworkError);
        assert_eq!(classify_message("Internal error"), GenerationErrorCode::GenerationFailed);
    }

    #[test]
    fn test_structured_status_wins_over_wording() {
        // Wording alone would say "network"
        let err = classify(api(429, None, "connection pool busy"));
        assert_eq!(err.code, GenerationErrorCode::QuotaExceeded);

        let err = classify(api(403, None, "The caller does not have access"));
        assert_eq!(err.code, GenerationErrorCode::AuthFailed);

        let err = classify(api(400, Some("UNAUTHENTICATED"), "Request had invalid credentials"));
        assert_eq!(err.code, GenerationErrorCode::AuthFailed);
    }

    #[test]
    fn test_api_message_fallback() {
        let err = classify(api(
            400,
            Some("INVALID_ARGUMENT"),
            "Image generation failed with the following error: prompt blocked by safety filter",
        ));
        assert_eq!(err.code, GenerationErrorCode::InvalidPromptContent);
    }

    #[test]
    fn test_format_and_unknown() {
        let err = classify(BackendError::Format("Invalid image data format".to_string()));
        assert_eq!(err.code, GenerationErrorCode::GenerationFailed);

        let err = classify(BackendError::Unknown);
        assert_eq!(err.code, GenerationErrorCode::UnknownError);
        assert_eq!(err.message, "An unknown error occurred");
    }

    #[test]
    fn test_cause_is_kept() {
        use std::error::Error as _;
        let err = classify(api(429, None, "slow down"));
        assert!(err.source().unwrap().to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_network_error() {
        let transport = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        let err = classify(BackendError::Transport(transport));
        assert_eq!(err.code, GenerationErrorCode::NetworkError);
    }
}
