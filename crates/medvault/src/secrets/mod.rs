//! Secret record bootstrap, persistence, and in-memory access.
//!
//! # Lifecycle
//!
//! 1. At startup, [`SecretStore::initialize`] reads the JSON record at
//!    `SECRETS_FILE`. When the file is absent or cannot be parsed, a fresh
//!    signing key and encryption key are generated and written with mode `0600`.
//! 2. The loaded record lives in memory behind an `ArcSwapOption`; readers never
//!    take a lock.
//! 3. The setup ceremony calls [`SecretStore::save_password_hash`] exactly once.
//!    The record is rewritten via temp-file + rename and only then swapped in.
//!
//! # Security invariants
//!
//! - Keys are generated once per deployment. Regenerating the signing key
//!   invalidates every session; regenerating the encryption key makes every
//!   stored ciphertext unreadable.
//! - Key material is never logged and is zeroed when dropped.

mod file;
pub mod record;
pub mod store;

pub use record::{KeyMaterial, SecretRecord, SIGNING_KEY_LEN};
pub use store::SecretStore;

use thiserror::Error;

/// Errors produced by the secret store.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// [`SecretStore::initialize`] has not run yet.
    #[error("secret store not yet initialised")]
    NotInitialised,

    /// The persisted record exists but its content is unusable.
    #[error("secret file is corrupt: {0}")]
    Corrupt(String),

    /// Reading or writing the secret file failed.
    #[error("secret file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialised.
    #[error("secret record serialisation failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
