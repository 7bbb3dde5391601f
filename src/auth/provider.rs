//! Identity provider seam.
//!
//! [`IdentityProvider`] is everything the auth client needs from a sign-in
//! SDK: the interactive flow, token refresh, a session check and revocation.
//! [`super::GoogleOAuthProvider`] is the production implementation.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ProviderTokens, SignInOutcome, TokenSet};

/// Provider-specific failures, mapped to auth error codes by the client
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Sign-in was cancelled by the user")]
    Cancelled,

    #[error("Another sign-in is already in progress")]
    InProgress,

    #[error("Google services unavailable: {0}")]
    ServicesUnavailable(String),

    #[error("{0}")]
    Failed(String),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ProviderError::ServicesUnavailable(err.to_string())
        } else {
            ProviderError::Http(err)
        }
    }
}

/// Identity provider trait: swappable sign-in backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// One-time setup. Called once per auth client.
    async fn configure(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Run the interactive consent flow.
    async fn sign_in(&self) -> Result<SignInOutcome, ProviderError>;

    /// Obtain a fresh access token for the current session.
    async fn refresh(&self, tokens: &TokenSet) -> Result<ProviderTokens, ProviderError>;

    /// Ask the provider whether the session is still valid.
    async fn check_session(&self, tokens: &TokenSet) -> Result<bool, ProviderError>;

    /// Revoke the provider session.
    async fn sign_out(&self, tokens: Option<&TokenSet>) -> Result<(), ProviderError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Scripted provider for tests.
#[cfg(test)]
pub mod fake {
    use super::*;
    use crate::auth::User;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    pub fn user() -> User {
        User {
            id: "108".to_string(),
            name: Some("Ada Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            photo: Some("https://example.com/ada.png".to_string()),
            given_name: Some("Ada".to_string()),
            family_name: Some("Lovelace".to_string()),
        }
    }

    pub fn tokens(access: &str, refresh: Option<&str>, expires_in: i64) -> ProviderTokens {
        ProviderTokens {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            id_token: Some(format!("id-{access}")),
            expires_in,
        }
    }

    #[derive(Default)]
    pub struct FakeProvider {
        pub sign_ins: Mutex<VecDeque<Result<SignInOutcome, ProviderError>>>,
        pub refreshes: Mutex<VecDeque<Result<ProviderTokens, ProviderError>>>,
        pub session: Mutex<Option<Result<bool, ProviderError>>>,
        pub sign_out_error: Mutex<Option<ProviderError>>,
        pub configure_calls: AtomicUsize,
        pub refresh_calls: AtomicUsize,
        pub sign_out_calls: AtomicUsize,
        pub refresh_delay: Option<Duration>,
    }

    impl FakeProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_sign_in(&self, outcome: Result<SignInOutcome, ProviderError>) {
            self.sign_ins.lock().unwrap().push_back(outcome);
        }

        pub fn push_refresh(&self, outcome: Result<ProviderTokens, ProviderError>) {
            self.refreshes.lock().unwrap().push_back(outcome);
        }

        pub fn set_session(&self, outcome: Result<bool, ProviderError>) {
            *self.session.lock().unwrap() = Some(outcome);
        }

        pub fn fail_sign_out(&self, err: ProviderError) {
            *self.sign_out_error.lock().unwrap() = Some(err);
        }

        pub fn refresh_count(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn configure(&self) -> Result<(), ProviderError> {
            self.configure_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn sign_in(&self) -> Result<SignInOutcome, ProviderError> {
            self.sign_ins
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Failed("no scripted sign-in".to_string())))
        }

        async fn refresh(&self, _tokens: &TokenSet) -> Result<ProviderTokens, ProviderError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.refresh_delay {
                tokio::time::sleep(delay).await;
            }
            self.refreshes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Failed("no scripted refresh".to_string())))
        }

        async fn check_session(&self, _tokens: &TokenSet) -> Result<bool, ProviderError> {
            self.session.lock().unwrap().take().unwrap_or(Ok(true))
        }

        async fn sign_out(&self, _tokens: Option<&TokenSet>) -> Result<(), ProviderError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            match self.sign_out_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }
}
