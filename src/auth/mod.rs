//! Authentication: Google sign-in and the token lifecycle
//!
//! This module provides:
//! - [`AuthClient`] for sign-in, sign-out and always-fresh access tokens
//! - [`IdentityProvider`] trait, the seam to the sign-in backend
//! - [`GoogleOAuthProvider`] using OAuth2 PKCE with a loopback redirect
//! - Session data types ([`User`], [`TokenSet`])

mod callback_server;
mod client;
mod google;
mod pkce;
mod provider;
mod types;

pub use client::AuthClient;
pub use google::{GoogleEndpoints, GoogleOAuthProvider};
pub use provider::{IdentityProvider, ProviderError};
pub use types::{ProviderTokens, SignInOutcome, TokenSet, User, REFRESH_THRESHOLD_MINUTES};

#[cfg(test)]
pub(crate) use provider::fake;
