//! # esign-auth
//!
//! Authentication for the e-signature REST API samples:
//! - Integrator credentials and their validation
//! - OAuth 2.0 authorization code grant (login URL, redirect parsing, CSRF state)
//! - Code exchange with token listeners
//! - Account discovery (account id and REST base URL)
//! - HTTP client building
//!
//! ## Usage
//!
//! ```rust,ignore
//! use esign_auth::{Credentials, oauth::{AuthorizationCode, Session}};
//!
//! let mut session = Session::new(Credentials::new(id, secret, redirect, auth_server)?)?;
//! println!("{}", session.build_authorization_url()?);
//! let token = session.exchange_code(&AuthorizationCode::new(code)).await?;
//! let binding = session.discover_account(&token).await?;
//! ```

pub mod credentials;
pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use credentials::Credentials;
pub use error::{Error, ErrorKind};
