//! Session data: the signed-in user and their OAuth2 tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderError;

/// Access tokens are refreshed once they are this close to expiry
pub const REFRESH_THRESHOLD_MINUTES: i64 = 5;

/// Profile snapshot from the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable provider subject identifier
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    pub email: String,

    #[serde(default)]
    pub photo: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub family_name: Option<String>,
}

/// OAuth2 tokens held for the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    /// The access token for API requests
    pub access_token: String,

    /// The refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// OpenID Connect ID token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// When the access token expires
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Build a token set from a fresh provider response.
    ///
    /// `expires_in` comes off the wire; values that do not fit a timestamp
    /// are rejected.
    pub fn from_provider(tokens: ProviderTokens) -> Result<Self, ProviderError> {
        let expires_at = Duration::try_seconds(tokens.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                ProviderError::Failed(format!(
                    "Token lifetime out of range: expires_in={}",
                    tokens.expires_in
                ))
            })?;

        Ok(Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            id_token: tokens.id_token,
            expires_at,
        })
    }

    /// Apply a refresh response, keeping the refresh and ID tokens the
    /// provider did not resend
    pub fn refreshed(&self, tokens: ProviderTokens) -> Result<Self, ProviderError> {
        let mut next = Self::from_provider(tokens)?;
        if next.refresh_token.is_none() {
            next.refresh_token = self.refresh_token.clone();
        }
        if next.id_token.is_none() {
            next.id_token = self.id_token.clone();
        }
        Ok(next)
    }

    /// True when the access token expires within the refresh threshold
    pub fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::minutes(REFRESH_THRESHOLD_MINUTES) >= self.expires_at
    }
}

/// Tokens as returned by a provider sign-in or refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

/// Result of an interactive sign-in
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: User,
    pub tokens: ProviderTokens,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_tokens(expires_in: i64) -> ProviderTokens {
        ProviderTokens {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            id_token: Some("id".to_string()),
            expires_in,
        }
    }

    #[test]
    fn test_tokens_not_expiring() {
        let tokens = TokenSet::from_provider(provider_tokens(3600)).unwrap();
        assert!(!tokens.needs_refresh());
    }

    #[test]
    fn test_tokens_expiring_soon() {
        // 2 minutes is inside the 5 minute threshold
        let tokens = TokenSet::from_provider(provider_tokens(120)).unwrap();
        assert!(tokens.needs_refresh());
    }

    #[test]
    fn test_tokens_expired() {
        let mut tokens = TokenSet::from_provider(provider_tokens(3600)).unwrap();
        tokens.expires_at = Utc::now() - Duration::hours(1);
        assert!(tokens.needs_refresh());
    }

    #[test]
    fn test_refresh_preserves_omitted_tokens() {
        let current = TokenSet::from_provider(provider_tokens(0)).unwrap();
        let next = current.refreshed(ProviderTokens {
            access_token: "access-2".to_string(),
            refresh_token: None,
            id_token: None,
            expires_in: 3600,
        })
        .unwrap();

        assert_eq!(next.access_token, "access-2");
        assert_eq!(next.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(next.id_token.as_deref(), Some("id"));
        assert!(!next.needs_refresh());
    }

    #[test]
    fn test_refresh_takes_rotated_refresh_token() {
        let current = TokenSet::from_provider(provider_tokens(0)).unwrap();
        let next = current.refreshed(ProviderTokens {
            refresh_token: Some("refresh-2".to_string()),
            ..provider_tokens(3600)
        })
        .unwrap();
        assert_eq!(next.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[test]
    fn test_absurd_lifetime_is_rejected() {
        for expires_in in [i64::MAX, i64::MIN, i64::MAX / 1000] {
            let result = TokenSet::from_provider(provider_tokens(expires_in));
            assert!(
                matches!(result, Err(ProviderError::Failed(ref msg)) if msg.contains("out of range")),
                "expires_in={expires_in} should be rejected"
            );
        }

        let current = TokenSet::from_provider(provider_tokens(3600)).unwrap();
        assert!(current.refreshed(provider_tokens(i64::MAX)).is_err());
    }

    #[test]
    fn test_token_set_wire_format() {
        let tokens = TokenSet {
            access_token: "a".to_string(),
            refresh_token: None,
            id_token: Some("i".to_string()),
            expires_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        };
        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["idToken"], "i");
        assert_eq!(json["expiresAt"], 1_700_000_000_000i64);
        assert!(json.get("refreshToken").is_none());
    }

    #[test]
    fn test_user_wire_format() {
        let user: User = serde_json::from_str(
            r#"{"id":"42","email":"kid@example.com","givenName":"Ada","photo":null}"#,
        )
        .unwrap();
        assert_eq!(user.given_name.as_deref(), Some("Ada"));
        assert!(user.family_name.is_none());
    }
}
