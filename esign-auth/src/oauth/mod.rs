//! OAuth 2.0 authorization code grant.
//!
//! Builds the login URL, captures the code from the redirect, exchanges it for an access
//! token and discovers the account binding used for REST calls.

mod discovery;
mod session;
mod state;

pub mod token;

pub use discovery::{rest_base_url, AccountBinding, LoginAccount, LoginInformation};
pub use session::{AuthorizationCode, AuthorizationRequest, Session, SessionState};
pub use state::StateManager;
