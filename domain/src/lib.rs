//! Envelope operations for the e-signature REST API.
//!
//! `gateway::esign::ApiGateway` is the authenticated REST client, `envelope` holds the
//! request and response payloads and `signing` composes them into the sample flows.
//! Errors from `esign-auth` are translated into [`error::Error`] so callers only
//! depend on this crate's error kinds.

pub use esign_auth::oauth::{token::AccessToken, AccountBinding};

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod signing;
