//! OAuth token types.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Access token obtained from the authorization code exchange.
///
/// Tokens are never patched in place: a new exchange produces a new value that replaces
/// the old one wholesale.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer token for API requests.
    pub access_token: SecretString,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Refresh token, when the server issued one.
    pub refresh_token: Option<SecretString>,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// When the exchange completed.
    pub issued_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from the raw token string, issued now.
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: SecretString::new(access_token.to_string()),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            scopes: vec![],
            issued_at: Utc::now(),
        }
    }

    /// The raw bearer token.
    pub fn secret(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.token_type == other.token_type
            && self.issued_at == other.issued_at
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert the wire response into an [`AccessToken`] stamped with `issued_at`.
    pub fn into_access_token(self, issued_at: DateTime<Utc>) -> AccessToken {
        AccessToken {
            access_token: SecretString::new(self.access_token),
            token_type: self
                .token_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self.refresh_token.map(SecretString::new),
            scopes: self
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            issued_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_response_defaults_to_bearer() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"tok123"}"#).unwrap();
        let token = response.into_access_token(Utc::now());

        assert_eq!(token.secret(), "tok123");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.refresh_token.is_none());
        assert!(token.scopes.is_empty());
    }

    #[test]
    fn test_full_response() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"bearer","refresh_token":"ref","expires_in":28800,"scope":"signature impersonation"}"#,
        )
        .unwrap();
        let token = response.into_access_token(Utc::now());

        assert_eq!(token.token_type, "bearer");
        assert_eq!(
            token.refresh_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("ref")
        );
        assert_eq!(token.scopes, vec!["signature", "impersonation"]);
    }

    #[test]
    fn test_missing_access_token_is_rejected() {
        let result: Result<TokenResponse, _> = serde_json::from_str(r#"{"token_type":"Bearer"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("very-secret");
        assert!(!format!("{:?}", token).contains("very-secret"));
    }
}
