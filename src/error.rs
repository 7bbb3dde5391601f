//! Error types for Colorbook

use std::fmt;

use thiserror::Error;

/// Result type alias for Colorbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by the typed auth and generation errors
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in Colorbook
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable string code for auth and generation failures
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::Auth(e) => Some(e.code.as_str()),
            Error::Generation(e) => Some(e.code.as_str()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Failure codes reported by the auth client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    SignInCancelled,
    SignInInProgress,
    PlayServicesUnavailable,
    SignInFailed,
    SignOutFailed,
    NoTokens,
    TokenRefreshFailed,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::SignInCancelled => "SIGN_IN_CANCELLED",
            AuthErrorCode::SignInInProgress => "SIGN_IN_IN_PROGRESS",
            AuthErrorCode::PlayServicesUnavailable => "PLAY_SERVICES_UNAVAILABLE",
            AuthErrorCode::SignInFailed => "SIGN_IN_FAILED",
            AuthErrorCode::SignOutFailed => "SIGN_OUT_FAILED",
            AuthErrorCode::NoTokens => "NO_TOKENS",
            AuthErrorCode::TokenRefreshFailed => "TOKEN_REFRESH_FAILED",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed auth failure: stable code, message, optional cause
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Cause>,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<Cause>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Failure codes reported by the generation client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationErrorCode {
    InvalidPrompt,
    EmptyPrompt,
    PromptTooLong,
    NoAuth,
    AuthFailed,
    InvalidPromptContent,
    QuotaExceeded,
    NetworkError,
    GenerationFailed,
    UnknownError,
}

impl GenerationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationErrorCode::InvalidPrompt => "INVALID_PROMPT",
            GenerationErrorCode::EmptyPrompt => "EMPTY_PROMPT",
            GenerationErrorCode::PromptTooLong => "PROMPT_TOO_LONG",
            GenerationErrorCode::NoAuth => "NO_AUTH",
            GenerationErrorCode::AuthFailed => "AUTH_FAILED",
            GenerationErrorCode::InvalidPromptContent => "INVALID_PROMPT_CONTENT",
            GenerationErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            GenerationErrorCode::NetworkError => "NETWORK_ERROR",
            GenerationErrorCode::GenerationFailed => "GENERATION_FAILED",
            GenerationErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for GenerationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed generation failure: stable code, message, optional cause
#[derive(Error, Debug)]
#[error("{message}")]
pub struct GenerationError {
    pub code: GenerationErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Cause>,
}

impl GenerationError {
    pub fn new(code: GenerationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<Cause>) -> Self {
        self.source = Some(source.into());
        self
    }
}
