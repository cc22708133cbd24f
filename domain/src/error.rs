//! Error types for the `domain` layer.
use esign_auth::error::{Error as EsignAuthError, ErrorKind as EsignAuthErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error, including the name of the failing operation. The intent is to
/// translate errors between layers while maintaining layer boundaries: callers of
/// `domain` never need to depend on `esign-auth` error kinds directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Malformed or missing credentials/configuration.
    Config,
    /// The gateway was used before an account binding was configured.
    NotConfigured,
    /// A required identifier or argument was empty or malformed.
    InvalidInput(String),
    /// Reading a document or writing a download failed.
    Io,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// The request could not be sent or the connection failed.
    Network,
    /// Missing, expired or rejected access token.
    Unauthorized,
    /// The authorization code could not be exchanged.
    AuthExchange,
    /// The account lookup failed or returned no accounts.
    Discovery,
    /// The remote service answered with a non-success status.
    Transport(String),
    Other(String),
}

impl Error {
    pub(crate) fn internal(kind: InternalErrorKind, message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(kind),
        }
    }

    pub(crate) fn external(kind: ExternalErrorKind, message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::External(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
        }
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
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Io),
        }
    }
}

// This is where we translate errors from the `esign-auth` layer to the `domain` layer.
impl From<EsignAuthError> for Error {
    fn from(err: EsignAuthError) -> Self {
        let error_kind = match &err.error_kind {
            EsignAuthErrorKind::Configuration(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            EsignAuthErrorKind::OAuth(_) => DomainErrorKind::External(ExternalErrorKind::AuthExchange),
            EsignAuthErrorKind::Discovery(_) => {
                DomainErrorKind::External(ExternalErrorKind::Discovery)
            }
            EsignAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esign_auth::error::{
        configuration_error, discovery_error, oauth_error, ConfigurationErrorKind,
        DiscoveryErrorKind, OAuthErrorKind,
    };

    #[test]
    fn test_auth_errors_translate_to_domain_kinds() {
        let err: Error =
            configuration_error(ConfigurationErrorKind::MissingValue, "client_id").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );

        let err: Error = oauth_error(OAuthErrorKind::TokenExchangeFailed, "bad code").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::AuthExchange)
        );

        let err: Error = discovery_error(DiscoveryErrorKind::NoAccounts, "none").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Discovery)
        );
    }

    #[test]
    fn test_source_is_preserved() {
        let err: Error = discovery_error(DiscoveryErrorKind::NoAccounts, "account list is empty").into();
        let source = StdError::source(&err).expect("source should be kept");
        assert!(source.to_string().contains("account list is empty"));
    }

    #[test]
    fn test_display_names_operation() {
        let err = Error::external(
            ExternalErrorKind::Transport("404 Not Found".to_string()),
            "get_envelope: 404 Not Found",
        );
        assert!(err.to_string().contains("get_envelope"));
    }
}
