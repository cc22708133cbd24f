//! Token listeners notified after a successful exchange.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use super::AccessToken;
use crate::error::BoxError;

/// Caller-supplied hook invoked synchronously with each freshly acquired token.
pub type TokenListener = Box<dyn Fn(&AccessToken) -> Result<(), BoxError> + Send + Sync>;

/// Registered token listeners.
///
/// Notification is fire-and-forget: a listener that fails or panics is logged and
/// skipped, and never affects the exchange that produced the token.
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<TokenListener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: TokenListener) {
        self.listeners.push(listener);
    }

    /// Invoke every listener once with `token`.
    pub fn notify(&self, token: &AccessToken) {
        for (index, listener) in self.listeners.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener(token))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Token listener {} failed: {}", index, e),
                Err(_) => warn!("Token listener {} panicked", index),
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
