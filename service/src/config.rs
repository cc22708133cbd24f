use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use esign_auth::http::HttpClientConfig;
use esign_auth::Credentials;
use log::LevelFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Authorization server for developer (demo) accounts.
pub const DEFAULT_AUTH_SERVER_URL: &str = "https://account-d.docusign.com";

/// Redirect URI registered on the integrator key during local development.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/auth/callback";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The integrator key, used as the OAuth client id.
    #[arg(long, env)]
    client_id: Option<String>,

    /// The secret key paired with the integrator key.
    #[arg(long, env, hide_env_values = true)]
    client_secret: Option<String>,

    /// The redirect URI registered on the integrator key. Must match exactly.
    #[arg(long, env, default_value = DEFAULT_REDIRECT_URI)]
    redirect_uri: String,

    /// The authorization server root (developer or production).
    #[arg(long, env, default_value = DEFAULT_AUTH_SERVER_URL)]
    auth_server_url: String,

    /// Timeout in seconds for each HTTP request
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Directory that downloaded envelope documents are written to
    #[arg(long, env, default_value = ".")]
    pub download_dir: PathBuf,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

/// Load `.env` into the process environment so the `env` fallbacks of every flag see
/// it. Must run before the command line is parsed; a missing file is not an error.
pub fn load_dotenv() {
    dotenv().ok();
}

impl Config {
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn auth_server_url(&self) -> &str {
        &self.auth_server_url
    }

    /// Validated credentials for the authorization session.
    ///
    /// A missing client id or secret surfaces as a configuration error rather than
    /// failing argument parsing, so the binary can report which value is absent.
    pub fn credentials(&self) -> Result<Credentials, esign_auth::Error> {
        Credentials::new(
            self.client_id.as_deref().unwrap_or_default(),
            self.client_secret.as_deref().unwrap_or_default(),
            &self.redirect_uri,
            &self.auth_server_url,
        )
    }

    /// HTTP settings shared by the session and the gateway.
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
            ..Default::default()
        }
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
