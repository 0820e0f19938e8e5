//! Shared application state injected into every Axum handler.

use crate::auth::{Authority, SigningAlgorithm};
use crate::secrets::SecretStore;

/// Default minimum length of the operator password.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Application state shared across all request handlers.
///
/// Every field is `Arc`-backed, so Axum clones the state per request without
/// copying key material.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Owner of the persisted secret record.
    pub secrets: SecretStore,
    /// Password checks and session tokens.
    pub authority: Authority,
    /// Setup passwords shorter than this (in characters) are refused.
    pub min_password_length: usize,
}

impl AppState {
    pub fn new(secrets: SecretStore, authority: Authority, min_password_length: usize) -> Self {
        Self {
            secrets,
            authority,
            min_password_length,
        }
    }
}

impl Default for AppState {
    /// A state over a store that was never initialised, suitable for tests.
    fn default() -> Self {
        let secrets = SecretStore::new("secrets.json");
        let authority = Authority::new(
            secrets.clone(),
            SigningAlgorithm::Hs256,
            std::time::Duration::from_secs(7 * 24 * 60 * 60),
        );
        Self::new(secrets, authority, DEFAULT_MIN_PASSWORD_LENGTH)
    }
}
