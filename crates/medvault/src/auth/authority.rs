//! [`Authority`]: operator credential checks and session issuance.

use std::sync::Arc;
use std::time::Duration;

use common::protocol::SetupStatusResponse;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::token::{self, Claims, SigningAlgorithm, TokenError};
use super::{password, AuthError, SUBJECT};
use crate::secrets::SecretStore;

/// Verifies the operator password and issues and validates session tokens.
///
/// Cloning is cheap; clones share the secret store.
#[derive(Clone)]
pub struct Authority {
    store: SecretStore,
    algorithm: SigningAlgorithm,
    lifetime: Duration,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Authority {
    /// Create an authority over `store` that issues tokens valid for `lifetime`.
    pub fn new(store: SecretStore, algorithm: SigningAlgorithm, lifetime: Duration) -> Self {
        Self {
            store,
            algorithm,
            lifetime,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    /// Whether the setup ceremony has completed.
    pub fn setup_status(&self) -> SetupStatusResponse {
        SetupStatusResponse {
            configured: self.store.is_configured(),
        }
    }

    /// Check `plain` against the stored operator password.
    ///
    /// Returns `false`, not an error, while no password is configured.
    pub fn verify_password(&self, plain: &str) -> bool {
        match self.store.password_hash() {
            Some(hash) => password::verify_password(plain, &hash),
            None => false,
        }
    }

    /// Issue a session token with the configured default lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Secrets`] if the signing key is not loaded.
    pub fn issue_token(&self) -> Result<String, AuthError> {
        self.issue_token_for(self.lifetime)
    }

    /// Issue a session token valid for `lifetime` from now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Secrets`] if the signing key is not loaded.
    pub fn issue_token_for(&self, lifetime: Duration) -> Result<String, AuthError> {
        let key = self.store.signing_key()?;
        let now = self.clock.now();
        let lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: SUBJECT.to_owned(),
            iat: now,
            exp: now.saturating_add(lifetime_secs),
        };
        Ok(token::encode(&claims, self.algorithm, key.as_bytes())?)
    }

    /// Verify signature, expiry, and subject.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] on any validation failure, or
    /// [`AuthError::Secrets`] if the signing key is not loaded.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let key = self.store.signing_key()?;
        let claims = token::decode(token, self.algorithm, key.as_bytes())?;
        if self.clock.now() >= claims.exp {
            return Err(TokenError::Expired.into());
        }
        if claims.sub != SUBJECT {
            return Err(TokenError::WrongSubject.into());
        }
        Ok(claims)
    }

    /// Guard used by every protected operation.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] when no token was presented, and
    /// otherwise whatever [`validate_token`](Self::validate_token) returns.
    pub fn require_session(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        self.validate_token(token).inspect_err(|e| {
            debug!(reason = %e, "session rejected");
        })
    }

    /// One-time setup ceremony: set the operator password and log in.
    ///
    /// The final configured check and the write happen under the secret
    /// store's write lock, so of several concurrent attempts, through this or
    /// any other authority over the same store, exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyConfigured`] if a password is already set;
    /// the stored hash is left untouched. Returns [`AuthError::Secrets`] if the
    /// record cannot be persisted.
    pub fn complete_setup(&self, password: &str) -> Result<String, AuthError> {
        if self.store.is_configured() {
            warn!("setup attempted after configuration completed");
            return Err(AuthError::AlreadyConfigured);
        }

        let hash =
            password::hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;
        if !self.store.save_password_hash_if_unset(&hash)? {
            warn!("setup lost a race with a concurrent setup");
            return Err(AuthError::AlreadyConfigured);
        }
        info!("setup completed; operator password set");

        self.issue_token()
    }

    /// Exchange the operator password for a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPassword`] on mismatch or when unconfigured.
    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        if !self.verify_password(password) {
            info!("login rejected");
            return Err(AuthError::InvalidPassword);
        }
        self.issue_token()
    }
}

impl std::fmt::Debug for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority")
            .field("store", &self.store)
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
