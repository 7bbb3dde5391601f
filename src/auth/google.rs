//! GoogleOAuthProvider - installed-app OAuth2 sign-in against Google
//!
//! Manages the complete OAuth2 PKCE flow:
//! - Browser-based authorization with a loopback redirect
//! - Code exchange and token refresh
//! - OpenID Connect profile lookup
//! - Session check and revocation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::callback_server::{bind, redirect_uri, wait_for_code};
use super::pkce::{random_state, PkcePair};
use super::provider::{IdentityProvider, ProviderError};
use super::types::{ProviderTokens, SignInOutcome, TokenSet, User};
use crate::config::OAuthConfig;

/// Scopes for the profile snapshot plus Imagen access
const SCOPES: &[&str] = &[
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/cloud-platform",
];

/// Access token lifetime assumed when Google omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Google OAuth2 and OpenID Connect endpoints
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth: String,
    pub token: String,
    pub userinfo: String,
    pub tokeninfo: String,
    pub revoke: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            userinfo: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            tokeninfo: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            revoke: "https://oauth2.googleapis.com/revoke".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<TokenResponse> for ProviderTokens {
    fn from(resp: TokenResponse) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            id_token: resp.id_token,
            expires_in: resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfo> for User {
    fn from(info: UserInfo) -> Self {
        Self {
            id: info.sub,
            name: info.name,
            email: info.email,
            photo: info.picture,
            given_name: info.given_name,
            family_name: info.family_name,
        }
    }
}

#[derive(Debug, Serialize)]
struct CodeExchange<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    code_verifier: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'a str,
}

/// Google sign-in provider
#[derive(Clone)]
pub struct GoogleOAuthProvider {
    oauth: OAuthConfig,
    endpoints: GoogleEndpoints,
    http_client: Client,
}

impl GoogleOAuthProvider {
    pub fn new(oauth: OAuthConfig) -> Self {
        Self {
            oauth,
            endpoints: GoogleEndpoints::default(),
            http_client: Client::new(),
        }
    }

    /// Point the provider at other endpoints (tests, proxies)
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn authorization_url(&self, challenge: &str, state: &str) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.endpoints.auth)
            .map_err(|e| ProviderError::Failed(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.oauth.client_id)
            .append_pair("redirect_uri", &redirect_uri(self.oauth.callback_port))
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<ProviderTokens, ProviderError> {
        let redirect = redirect_uri(self.oauth.callback_port);
        let request = CodeExchange {
            client_id: &self.oauth.client_id,
            client_secret: &self.oauth.client_secret,
            code,
            code_verifier: verifier,
            redirect_uri: &redirect,
            grant_type: "authorization_code",
        };

        let response = self.http_client.post(&self.endpoints.token).form(&request).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Failed(format!("Token exchange failed: {}", error_text)));
        }

        let tokens: TokenResponse = response.json().await?;
        Ok(tokens.into())
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User, ProviderError> {
        let response = self
            .http_client
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Failed(format!("Profile lookup failed: {}", error_text)));
        }

        let info: UserInfo = response.json().await?;
        Ok(info.into())
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthProvider {
    async fn configure(&self) -> Result<(), ProviderError> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(ProviderError::Failed(
                "OAuth client_id is not configured. Run 'colorbook onboard' first.".to_string(),
            ));
        }
        Url::parse(&self.endpoints.auth)
            .map_err(|e| ProviderError::Failed(format!("Invalid auth URL: {}", e)))?;
        Ok(())
    }

    async fn sign_in(&self) -> Result<SignInOutcome, ProviderError> {
        // Bind before opening the browser so a concurrent flow is caught early
        let listener = bind(self.oauth.callback_port).await?;

        let pkce = PkcePair::generate();
        let state = random_state();
        let auth_url = self.authorization_url(&pkce.challenge, &state)?;

        crate::ui::print_step("Opening browser for Google sign-in...");
        crate::ui::print_step(&format!("If the browser doesn't open, visit:\n\n{}\n", auth_url));
        if let Err(e) = open::that(&auth_url) {
            tracing::warn!("Failed to open browser: {}", e);
        }

        let code = wait_for_code(listener, &state).await?;
        tracing::debug!("Authorization code received, exchanging");

        let tokens = self.exchange_code(&code.code, &pkce.verifier).await?;
        let user = self.fetch_user(&tokens.access_token).await?;
        Ok(SignInOutcome { user, tokens })
    }

    async fn refresh(&self, tokens: &TokenSet) -> Result<ProviderTokens, ProviderError> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| ProviderError::Failed("No refresh token in session".to_string()))?;

        let request = RefreshRequest {
            client_id: &self.oauth.client_id,
            client_secret: &self.oauth.client_secret,
            refresh_token,
            grant_type: "refresh_token",
        };

        let response = self.http_client.post(&self.endpoints.token).form(&request).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Failed(format!("Token refresh failed: {}", error_text)));
        }

        let tokens: TokenResponse = response.json().await?;
        Ok(tokens.into())
    }

    async fn check_session(&self, tokens: &TokenSet) -> Result<bool, ProviderError> {
        if tokens.needs_refresh() {
            // Access token is stale; the session lives on if it can be refreshed
            return Ok(tokens.refresh_token.is_some());
        }

        let response = self
            .http_client
            .get(&self.endpoints.tokeninfo)
            .query(&[("access_token", tokens.access_token.as_str())])
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn sign_out(&self, tokens: Option<&TokenSet>) -> Result<(), ProviderError> {
        let Some(tokens) = tokens else {
            return Ok(());
        };
        let token = tokens.refresh_token.as_deref().unwrap_or(&tokens.access_token);

        let response = self
            .http_client
            .post(&self.endpoints.revoke)
            .form(&[("token", token)])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Already expired or revoked elsewhere
            StatusCode::BAD_REQUEST => {
                tracing::debug!("Revoke rejected token as invalid, treating as signed out");
                Ok(())
            }
            status => {
                let error_text = response.text().await?;
                Err(ProviderError::Failed(format!("Revoke failed ({}): {}", status, error_text)))
            }
        }
    }

    fn name(&self) -> &str {
        "google"
    }
}
