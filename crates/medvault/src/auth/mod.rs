//! Operator credential and stateless session handling.
//!
//! # Invariants
//!
//! - The only subject ever issued or accepted is [`SUBJECT`].
//! - Token validity depends solely on the HMAC under the current signing key and
//!   on `exp`. There is no revocation list; rotating the signing key is the only
//!   way to invalidate issued sessions.
//! - Internally every rejection reason is a distinct [`TokenError`]; externally
//!   they all collapse to one unauthorized signal.

pub mod authority;
pub mod clock;
pub mod password;
pub mod token;

pub use authority::Authority;
pub use clock::{Clock, SystemClock};
pub use token::{Claims, SigningAlgorithm, TokenError};

use thiserror::Error;

use crate::secrets::SecretsError;

/// Subject of every session token: the single application operator.
pub const SUBJECT: &str = "medvault";

/// Errors produced by the [`Authority`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The presented password does not match, or none is configured.
    #[error("invalid password")]
    InvalidPassword,

    /// A protected operation was called without a bearer token.
    #[error("missing bearer token")]
    MissingToken,

    /// The token failed validation.
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] TokenError),

    /// The setup ceremony was attempted a second time.
    #[error("setup already completed")]
    AlreadyConfigured,

    /// Argon2 refused to hash the password.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The secret store is not loaded or could not be written.
    #[error(transparent)]
    Secrets(#[from] SecretsError),
}

impl AuthError {
    /// `true` for failures that must surface as a generic 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidPassword | AuthError::MissingToken | AuthError::InvalidToken(_)
        )
    }
}
