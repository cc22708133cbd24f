//! Access tokens and the listeners notified when a new one arrives.

mod listener;
mod tokens;

pub use listener::{Listeners, TokenListener};
pub use tokens::{AccessToken, TokenResponse};
