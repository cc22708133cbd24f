//! Error types for the `esign-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Boxed error type used for error sources and token listener failures.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error type for esign-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<BoxError>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in esign-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Configuration(ConfigurationErrorKind),
    OAuth(OAuthErrorKind),
    Discovery(DiscoveryErrorKind),
    Http(HttpErrorKind),
}

/// Errors from malformed or missing credentials.
#[derive(Debug, PartialEq)]
pub enum ConfigurationErrorKind {
    MissingValue,
    InvalidUrl,
}

/// Errors from the authorization step and the code exchange.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The redirect carried an `error` parameter or no `code`.
    AuthorizationFailed,
    /// The redirect `state` does not match an issued, unexpired state.
    InvalidState,
    /// The code was empty, already submitted, or rejected by the token endpoint.
    TokenExchangeFailed,
    InvalidResponse,
    Network,
}

/// Errors from the account discovery call.
#[derive(Debug, PartialEq)]
pub enum DiscoveryErrorKind {
    NoAccounts,
    RequestFailed,
    InvalidResponse,
    Network,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl Error {
    /// True for every failure of the token exchange step.
    pub fn is_auth_exchange(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::OAuth(
                OAuthErrorKind::TokenExchangeFailed
                    | OAuthErrorKind::InvalidResponse
                    | OAuthErrorKind::Network
            )
        )
    }

    pub fn is_discovery(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Discovery(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Configuration(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Configuration(kind) => write!(f, "Configuration error: {:?}", kind)?,
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Discovery(kind) => write!(f, "Account discovery error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create configuration errors.
pub fn configuration_error(kind: ConfigurationErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Configuration(kind),
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create discovery errors.
pub fn discovery_error(kind: DiscoveryErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Discovery(kind),
    }
}
