//! AuthClient - session lifecycle on top of an identity provider
//!
//! Keeps the signed-in user and their tokens in memory, mirrors them into a
//! [`KeyValueStore`], and hands out access tokens that are refreshed lazily
//! once they come within [`REFRESH_THRESHOLD_MINUTES`] of expiry.
//!
//! [`REFRESH_THRESHOLD_MINUTES`]: super::types::REFRESH_THRESHOLD_MINUTES

use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, warn};

use super::provider::{IdentityProvider, ProviderError};
use super::types::{TokenSet, User};
use crate::error::{AuthError, AuthErrorCode, Error};
use crate::storage::{KeyValueStore, SIGNED_IN_KEY, TOKENS_KEY, USER_KEY};
use crate::Result;

#[derive(Debug, Default)]
struct Session {
    user: Option<User>,
    tokens: Option<TokenSet>,
}

/// Signed-in session manager.
///
/// Construct once and share (it is `Send + Sync`); concurrent refreshes are
/// serialized so a burst of callers during expiry costs one provider refresh.
pub struct AuthClient {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn KeyValueStore>,
    session: RwLock<Session>,
    refresh_guard: Mutex<()>,
    configured: OnceCell<()>,
}

impl AuthClient {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider,
            store,
            session: RwLock::new(Session::default()),
            refresh_guard: Mutex::new(()),
            configured: OnceCell::new(),
        }
    }

    /// Configure the provider (once) and restore any stored session.
    ///
    /// Restore problems are logged and leave the client signed out.
    pub async fn initialize(&self) -> Result<()> {
        self.configured
            .get_or_try_init(|| async {
                self.provider.configure().await.map_err(|e| {
                    Error::Config(format!("Failed to configure {} sign-in: {}", self.provider.name(), e))
                })
            })
            .await?;

        match self.restore().await {
            Ok(Some(user)) => info!(email = %user.email, "Restored stored session"),
            Ok(None) => debug!("No stored session"),
            Err(e) => {
                warn!("Failed to restore session, continuing signed out: {}", e);
                *self.session.write().await = Session::default();
            }
        }
        Ok(())
    }

    async fn restore(&self) -> Result<Option<User>> {
        let (flag, user, tokens) = tokio::try_join!(
            self.store.get(SIGNED_IN_KEY),
            self.store.get(USER_KEY),
            self.store.get(TOKENS_KEY),
        )?;

        if flag.as_deref() != Some("true") {
            return Ok(None);
        }
        let (Some(user), Some(tokens)) = (user, tokens) else {
            return Ok(None);
        };

        let user: User = serde_json::from_str(&user)?;
        let tokens: TokenSet = serde_json::from_str(&tokens)?;

        let mut session = self.session.write().await;
        session.user = Some(user.clone());
        session.tokens = Some(tokens);
        Ok(Some(user))
    }

    /// Run the provider's consent flow and store the new session.
    pub async fn sign_in(&self) -> Result<User> {
        info!(provider = self.provider.name(), "Starting sign-in");
        let outcome = self.provider.sign_in().await.map_err(sign_in_error)?;

        let user = outcome.user;
        let tokens = TokenSet::from_provider(outcome.tokens).map_err(sign_in_error)?;

        self.persist_session(&user, &tokens).await.map_err(|e| {
            AuthError::new(AuthErrorCode::SignInFailed, "Failed to store the signed-in session")
                .with_source(e)
        })?;

        let mut session = self.session.write().await;
        session.user = Some(user.clone());
        session.tokens = Some(tokens);

        info!(email = %user.email, "Signed in");
        Ok(user)
    }

    /// Revoke the provider session and forget everything stored.
    pub async fn sign_out(&self) -> Result<()> {
        let tokens = self.tokens().await;

        self.provider.sign_out(tokens.as_ref()).await.map_err(|e| {
            AuthError::new(AuthErrorCode::SignOutFailed, "Failed to sign out").with_source(e)
        })?;
        self.clear_stored().await.map_err(|e| {
            AuthError::new(AuthErrorCode::SignOutFailed, "Failed to clear the stored session")
                .with_source(e)
        })?;

        *self.session.write().await = Session::default();
        info!("Signed out");
        Ok(())
    }

    /// Current access token, refreshed first if it is close to expiry.
    pub async fn access_token(&self) -> Result<String> {
        let tokens = self.tokens().await.ok_or_else(no_tokens)?;
        if !tokens.needs_refresh() {
            debug!("Using cached access token");
            return Ok(tokens.access_token);
        }

        let _guard = self.refresh_guard.lock().await;

        // Another caller may have refreshed (or failed and cleared) while we waited
        let tokens = self.tokens().await.ok_or_else(no_tokens)?;
        if !tokens.needs_refresh() {
            debug!("Access token refreshed by a concurrent caller");
            return Ok(tokens.access_token);
        }

        info!("Access token near expiry, refreshing");
        let refreshed = self
            .provider
            .refresh(&tokens)
            .await
            .and_then(|fresh| tokens.refreshed(fresh));
        match refreshed {
            Ok(next) => {
                if let Err(e) = self.store_tokens(&next).await {
                    warn!("Failed to persist refreshed tokens: {}", e);
                }
                self.session.write().await.tokens = Some(next.clone());
                info!(expires_at = %next.expires_at, "Access token refreshed");
                Ok(next.access_token)
            }
            Err(e) => {
                warn!("Token refresh failed, clearing session: {}", e);
                if let Err(clear_err) = self.clear_stored().await {
                    warn!("Failed to clear stored session: {}", clear_err);
                }
                *self.session.write().await = Session::default();
                Err(AuthError::new(
                    AuthErrorCode::TokenRefreshFailed,
                    "Failed to refresh access token, please sign in again",
                )
                .with_source(e)
                .into())
            }
        }
    }

    /// True when a session is held locally and the provider still accepts it.
    pub async fn is_signed_in(&self) -> bool {
        let Some(tokens) = self.tokens().await else {
            return false;
        };
        match self.provider.check_session(&tokens).await {
            Ok(valid) => valid,
            Err(e) => {
                debug!("Session check failed, treating as signed out: {}", e);
                false
            }
        }
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.session.read().await.user.clone()
    }

    async fn tokens(&self) -> Option<TokenSet> {
        self.session.read().await.tokens.clone()
    }

    async fn persist_session(&self, user: &User, tokens: &TokenSet) -> Result<()> {
        let user = serde_json::to_string(user)?;
        let tokens = serde_json::to_string(tokens)?;
        tokio::try_join!(
            self.store.set(USER_KEY, &user),
            self.store.set(TOKENS_KEY, &tokens),
            self.store.set(SIGNED_IN_KEY, "true"),
        )?;
        Ok(())
    }

    async fn store_tokens(&self, tokens: &TokenSet) -> Result<()> {
        let tokens = serde_json::to_string(tokens)?;
        self.store.set(TOKENS_KEY, &tokens).await
    }

    async fn clear_stored(&self) -> Result<()> {
        tokio::try_join!(
            self.store.remove(USER_KEY),
            self.store.remove(TOKENS_KEY),
            self.store.remove(SIGNED_IN_KEY),
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("provider", &self.provider.name())
            .field("store", &self.store.name())
            .finish()
    }
}

fn no_tokens() -> Error {
    AuthError::new(AuthErrorCode::NoTokens, "No tokens available, please sign in").into()
}

fn sign_in_error(err: ProviderError) -> Error {
    let (code, message) = match &err {
        ProviderError::Cancelled => (AuthErrorCode::SignInCancelled, "Sign in was cancelled"),
        ProviderError::InProgress => (AuthErrorCode::SignInInProgress, "Sign in is already in progress"),
        ProviderError::ServicesUnavailable(_) => {
            (AuthErrorCode::PlayServicesUnavailable, "Google services are not available")
        }
        _ => (AuthErrorCode::SignInFailed, "Sign in failed"),
    };

    let error = AuthError::new(code, message);
    match err {
        ProviderError::Cancelled | ProviderError::InProgress => error.into(),
        other => error.with_source(other).into(),
    }
}
