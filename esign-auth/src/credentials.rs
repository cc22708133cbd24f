//! Integrator credentials for the authorization code grant.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{configuration_error, ConfigurationErrorKind, Error, ErrorKind};

/// Client credentials and endpoints, supplied once at startup.
///
/// The integrator key doubles as the OAuth `client_id`. The `redirect_uri` must match
/// (case-sensitively) one of the redirect URIs registered on the key.
#[derive(Debug, Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    auth_server_url: String,
}

impl Credentials {
    /// Create validated credentials.
    ///
    /// Every value must be non-empty, and both URLs must be absolute.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        auth_server_url: &str,
    ) -> Result<Self, Error> {
        let credentials = Self {
            client_id: client_id.trim().to_string(),
            client_secret: SecretString::new(client_secret.to_string()),
            redirect_uri: redirect_uri.trim().to_string(),
            auth_server_url: auth_server_url.trim().trim_end_matches('/').to_string(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Check that all values are present and the URLs parse.
    pub fn validate(&self) -> Result<(), Error> {
        require("client_id", &self.client_id)?;
        require("client_secret", self.client_secret.expose_secret())?;
        require("redirect_uri", &self.redirect_uri)?;
        require("auth_server_url", &self.auth_server_url)?;

        parse_absolute("redirect_uri", &self.redirect_uri)?;
        parse_absolute("auth_server_url", &self.auth_server_url)?;
        Ok(())
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Authorization server root, without a trailing slash.
    pub fn auth_server_url(&self) -> &str {
        &self.auth_server_url
    }

    /// Join a path onto the authorization server root.
    pub(crate) fn auth_server_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.auth_server_url, path.trim_start_matches('/'))
    }
}

fn require(name: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(configuration_error(
            ConfigurationErrorKind::MissingValue,
            &format!("{name} must not be empty"),
        ));
    }
    Ok(())
}

fn parse_absolute(name: &str, value: &str) -> Result<Url, Error> {
    let url = Url::parse(value).map_err(|e| Error {
        source: Some(format!("{name} is not a valid URL: {e}").into()),
        error_kind: ErrorKind::Configuration(ConfigurationErrorKind::InvalidUrl),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(configuration_error(
            ConfigurationErrorKind::InvalidUrl,
            &format!("{name} must be an absolute http(s) URL"),
        ));
    }
    Ok(url)
}
