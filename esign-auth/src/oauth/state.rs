//! CSRF state management for the authorization redirect.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Issued state parameters awaiting the redirect, each with an expiry.
///
/// States are single use: validating one removes it whether or not it has expired.
#[derive(Debug, Clone)]
pub struct StateManager {
    states: HashMap<String, DateTime<Utc>>,
    ttl: Duration,
}

impl StateManager {
    /// Create a new state manager with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    /// Create a new state manager with custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: HashMap::new(),
            ttl,
        }
    }

    /// Generate and remember a new state token.
    pub fn generate(&mut self) -> String {
        let state = Self::generate_token();
        self.states.insert(state.clone(), Utc::now() + self.ttl);
        state
    }

    /// Validate and consume a state token.
    ///
    /// Returns `true` only for a known, unexpired state.
    pub fn validate(&mut self, state: &str) -> bool {
        match self.states.remove(state) {
            Some(expires_at) => Utc::now() <= expires_at,
            None => false,
        }
    }

    /// True when at least one issued state is still outstanding.
    pub fn has_pending(&self) -> bool {
        !self.states.is_empty()
    }

    /// Drop expired states.
    pub fn cleanup_expired(&mut self) {
        let now = Utc::now();
        self.states.retain(|_, expires_at| *expires_at > now);
    }

    /// Generate a cryptographically random state token.
    fn generate_token() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state() {
        let mut manager = StateManager::new();
        let state = manager.generate();
        assert_eq!(state.len(), 64); // 32 bytes hex encoded
        assert!(manager.has_pending());
    }

    #[test]
    fn test_validate_state() {
        let mut manager = StateManager::new();
        let state = manager.generate();
        assert!(manager.validate(&state));
    }

    #[test]
    fn test_validate_invalid_state() {
        let mut manager = StateManager::new();
        assert!(!manager.validate("invalid_state"));
    }

    #[test]
    fn test_state_consumed_after_validation() {
        let mut manager = StateManager::new();
        let state = manager.generate();

        assert!(manager.validate(&state));
        assert!(!manager.validate(&state));
        assert!(!manager.has_pending());
    }

    #[test]
    fn test_expired_state() {
        let mut manager = StateManager::with_ttl(Duration::seconds(-1));
        let state = manager.generate();
        assert!(!manager.validate(&state));
    }

    #[test]
    fn test_cleanup_expired() {
        let mut manager = StateManager::with_ttl(Duration::seconds(-1));
        manager.generate();
        manager.cleanup_expired();
        assert!(!manager.has_pending());
    }
}
