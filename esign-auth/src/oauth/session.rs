//! Authorization code grant session.

use std::collections::HashSet;

use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use super::discovery::{AccountBinding, LoginInformation};
use super::state::StateManager;
use super::token::{AccessToken, Listeners, TokenResponse};
use crate::credentials::Credentials;
use crate::error::{
    configuration_error, discovery_error, oauth_error, ConfigurationErrorKind, DiscoveryErrorKind,
    Error, ErrorKind, OAuthErrorKind,
};
use crate::http::ClientBuilder;

const AUTHORIZE_PATH: &str = "oauth/auth";
const TOKEN_PATH: &str = "oauth/token";
const USERINFO_PATH: &str = "oauth/userinfo";

/// Scope requested for envelope operations.
const SIGNATURE_SCOPE: &str = "signature";

/// Where a session is in the authorization code grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AuthorizationRequested,
    CodeReceived,
    TokenAcquired,
    AccountDiscovered,
}

/// Authorization request with the URL to open and the CSRF state it carries.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to open in a user agent.
    pub url: Url,
    /// CSRF state parameter expected back on the redirect.
    pub state: String,
}

/// Single-use authorization code captured from the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl From<&str> for AuthorizationCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Form body of the token request.
#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    grant_type: &'a str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

/// Drives the three-step authorization code grant and holds its results.
///
/// The session exclusively owns the current access token and account binding. Every
/// mutating operation takes `&mut self`, so at most one exchange can be in flight per
/// session, and a new token is committed with a single assignment.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    client: reqwest::Client,
    state: SessionState,
    csrf_states: StateManager,
    consumed_codes: HashSet<String>,
    access_token: Option<AccessToken>,
    account_binding: Option<AccountBinding>,
    listeners: Listeners,
}

impl Session {
    /// Create a session with a default HTTP client.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let client = ClientBuilder::new().build()?;
        Self::with_client(credentials, client)
    }

    /// Create a session using a preconfigured HTTP client.
    pub fn with_client(credentials: Credentials, client: reqwest::Client) -> Result<Self, Error> {
        credentials.validate()?;
        Ok(Self {
            credentials,
            client,
            state: SessionState::Unauthenticated,
            csrf_states: StateManager::new(),
            consumed_codes: HashSet::new(),
            access_token: None,
            account_binding: None,
            listeners: Listeners::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The most recently acquired token, if any.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// The most recently discovered binding, if any.
    pub fn account_binding(&self) -> Option<&AccountBinding> {
        self.account_binding.as_ref()
    }

    /// Register a hook called once with every newly acquired token.
    pub fn register_token_listener<F>(&mut self, listener: F)
    where
        F: Fn(&AccessToken) -> Result<(), crate::error::BoxError> + Send + Sync + 'static,
    {
        self.listeners.register(Box::new(listener));
    }

    /// Build the login URL for the user agent.
    ///
    /// Pure: the same credentials always produce the same URL.
    pub fn build_authorization_url(&self) -> Result<Url, Error> {
        self.authorization_url(None)
    }

    /// Build the login URL including an application supplied `state` value.
    pub fn build_authorization_url_with_state(&self, state: &str) -> Result<Url, Error> {
        self.authorization_url(Some(state))
    }

    /// Issue a fresh CSRF state and return the login URL carrying it.
    pub fn begin_authorization(&mut self) -> Result<AuthorizationRequest, Error> {
        self.csrf_states.cleanup_expired();
        let state = self.csrf_states.generate();
        let url = self.authorization_url(Some(&state))?;

        info!("Authorization requested for client {}", self.credentials.client_id());
        self.state = SessionState::AuthorizationRequested;
        Ok(AuthorizationRequest { url, state })
    }

    /// Extract the authorization code from the URL the user agent was redirected to.
    ///
    /// When states were issued through [`Session::begin_authorization`], the redirect must
    /// carry one of them.
    pub fn receive_redirect(&mut self, redirect_url: &str) -> Result<AuthorizationCode, Error> {
        let url = Url::parse(redirect_url.trim()).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::AuthorizationFailed),
        })?;

        let mut code = None;
        let mut state = None;
        let mut denial = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => denial = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(reason) = denial {
            warn!("Authorization was denied: {}", reason);
            return Err(oauth_error(
                OAuthErrorKind::AuthorizationFailed,
                &format!("authorization server returned error: {reason}"),
            ));
        }

        if self.csrf_states.has_pending() {
            let valid = state
                .as_deref()
                .map(|s| self.csrf_states.validate(s))
                .unwrap_or(false);
            if !valid {
                warn!("Redirect state did not match an issued state");
                return Err(oauth_error(
                    OAuthErrorKind::InvalidState,
                    "redirect state is missing, unknown or expired",
                ));
            }
        }

        let code = code
            .map(|c| AuthorizationCode::new(&c))
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                oauth_error(
                    OAuthErrorKind::AuthorizationFailed,
                    "redirect URL carries no authorization code",
                )
            })?;

        debug!("Authorization code received");
        self.state = SessionState::CodeReceived;
        Ok(code)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// On success the new token replaces any previous one and every registered listener
    /// is notified once. On failure the stored token is left untouched. A code is
    /// considered consumed as soon as it has been submitted to the token endpoint.
    pub async fn exchange_code(&mut self, code: &AuthorizationCode) -> Result<AccessToken, Error> {
        if code.is_empty() {
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                "authorization code must not be empty",
            ));
        }

        let digest = code.digest();
        if self.consumed_codes.contains(&digest) {
            warn!("Authorization code was already used");
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                "authorization code was already used",
            ));
        }

        let request = TokenExchangeRequest {
            grant_type: "authorization_code",
            code: code.as_str(),
            client_id: self.credentials.client_id(),
            client_secret: self.credentials.client_secret().expose_secret(),
            redirect_uri: self.credentials.redirect_uri(),
        };

        debug!("Exchanging authorization code for an access token");

        self.consumed_codes.insert(digest);
        let response = self
            .client
            .post(self.credentials.auth_server_endpoint(TOKEN_PATH))
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach token endpoint: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::Network),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Token endpoint rejected the code: {} - {}", status, error_text);
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("token endpoint returned {status}: {error_text}"),
            ));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })?;

        if body.access_token.is_empty() {
            return Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                "token response carries an empty access_token",
            ));
        }

        let token = body.into_access_token(Utc::now());
        self.access_token = Some(token.clone());
        self.state = SessionState::TokenAcquired;
        info!("Successfully exchanged authorization code for an access token");

        self.listeners.notify(&token);
        Ok(token)
    }

    /// Look up the user's accounts with `token` and bind to the first one.
    ///
    /// On failure neither the session state nor a previously discovered binding change.
    pub async fn discover_account(&mut self, token: &AccessToken) -> Result<AccountBinding, Error> {
        debug!("Retrieving account information");

        let response = self
            .client
            .get(self.credentials.auth_server_endpoint(USERINFO_PATH))
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach discovery endpoint: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::Discovery(DiscoveryErrorKind::Network),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Discovery endpoint error: {} - {}", status, error_text);
            return Err(discovery_error(
                DiscoveryErrorKind::RequestFailed,
                &format!("discovery endpoint returned {status}: {error_text}"),
            ));
        }

        let info: LoginInformation = response.json().await.map_err(|e| {
            warn!("Failed to parse account information: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Discovery(DiscoveryErrorKind::InvalidResponse),
            }
        })?;

        if info.accounts().len() > 1 {
            debug!(
                "User belongs to {} accounts, using the first",
                info.accounts().len()
            );
        }
        let binding = info.select_binding()?;

        info!(
            "Account {} uses base URL {}",
            binding.account_id, binding.base_url
        );
        self.account_binding = Some(binding.clone());
        self.state = SessionState::AccountDiscovered;
        Ok(binding)
    }

    fn authorization_url(&self, state: Option<&str>) -> Result<Url, Error> {
        let mut url = format!(
            "{}?\
            response_type=code&\
            scope={}&\
            client_id={}&\
            redirect_uri={}",
            self.credentials.auth_server_endpoint(AUTHORIZE_PATH),
            SIGNATURE_SCOPE,
            urlencoding::encode(self.credentials.client_id()),
            urlencoding::encode(self.credentials.redirect_uri()),
        );
        if let Some(state) = state {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(state));
        }

        Url::parse(&url).map_err(|e| {
            configuration_error(
                ConfigurationErrorKind::InvalidUrl,
                &format!("authorization URL is malformed: {e}"),
            )
        })
    }
}
