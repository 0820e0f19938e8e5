//! [`SecretStore`]: shared handle over the persisted secret record.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use tracing::{info, warn};

use super::record::{KeyMaterial, SecretRecord};
use super::{file, SecretsError};

/// Thread-safe owner of the secret record and its backing file.
///
/// Cloning is cheap; every clone refers to the same record. Reads go through an
/// [`ArcSwapOption`] and never block. The only mutation paths
/// ([`initialize`](Self::initialize) and
/// [`save_password_hash`](Self::save_password_hash)) are serialised by an
/// in-process mutex and swap the in-memory record only after the file has been
/// written.
#[derive(Clone)]
pub struct SecretStore {
    path: Arc<PathBuf>,
    record: Arc<ArcSwapOption<SecretRecord>>,
    write_lock: Arc<Mutex<()>>,
}

impl SecretStore {
    /// Create an empty store backed by `path`. Nothing is read until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            record: Arc::new(ArcSwapOption::empty()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the backing secret file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record, generating and persisting a fresh one when the
    /// file is missing or unusable.
    ///
    /// Must complete before the process serves requests.
    ///
    /// # Errors
    ///
    /// Returns an error only if a freshly generated record cannot be written.
    /// A corrupt or unreadable existing file is replaced, not reported.
    pub fn initialize(&self) -> Result<(), SecretsError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loaded = file::read(&self.path).and_then(|persisted| {
            persisted
                .as_ref()
                .map(SecretRecord::from_persisted)
                .transpose()
        });

        match loaded {
            Ok(Some(record)) => {
                info!(
                    path = %self.path.display(),
                    configured = record.is_configured(),
                    "secrets loaded"
                );
                self.record.store(Some(Arc::new(record)));
                return Ok(());
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no secret file found; generating secrets");
            }
            Err(e) => {
                // Losing the old encryption key already makes old ciphertext
                // unreadable; refusing to start would only add an outage.
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read secret file; regenerating secrets"
                );
            }
        }

        let record = SecretRecord::generate();
        file::write(&self.path, &record.to_persisted())?;
        self.record.store(Some(Arc::new(record)));
        info!(path = %self.path.display(), "first run: secrets generated and saved");
        Ok(())
    }

    /// Returns `true` once [`initialize`](Self::initialize) has loaded a record.
    pub fn is_ready(&self) -> bool {
        self.record.load().is_some()
    }

    /// Returns `true` once the operator password has been set.
    pub fn is_configured(&self) -> bool {
        self.record
            .load()
            .as_ref()
            .is_some_and(|record| record.is_configured())
    }

    /// Copy of the current token-signing key.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::NotInitialised`] before [`initialize`](Self::initialize).
    pub fn signing_key(&self) -> Result<KeyMaterial, SecretsError> {
        self.current().map(|r| r.signing_key().clone())
    }

    /// Copy of the current field encryption key.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::NotInitialised`] before [`initialize`](Self::initialize).
    pub fn encryption_key(&self) -> Result<KeyMaterial, SecretsError> {
        self.current().map(|r| r.encryption_key().clone())
    }

    /// The stored password hash, if the setup ceremony has completed.
    pub fn password_hash(&self) -> Option<String> {
        self.record
            .load()
            .as_ref()
            .and_then(|record| record.password_hash().map(str::to_owned))
    }

    /// Replace the password hash and persist the whole record atomically.
    ///
    /// Does not check whether a hash is already present; the setup ceremony owns
    /// that decision.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::NotInitialised`] before [`initialize`](Self::initialize),
    /// or [`SecretsError::Io`] if the file cannot be written. On error the
    /// in-memory record is left unchanged.
    pub fn save_password_hash(&self, hash: &str) -> Result<(), SecretsError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.persist_password_hash(hash)
    }

    /// Set the password hash only if none is stored yet.
    ///
    /// The check and the write happen under the store's write lock, so across
    /// every handle on this store at most one call returns `Ok(true)`.
    /// Returns `Ok(false)`, leaving the stored hash untouched, when a hash is
    /// already present.
    ///
    /// # Errors
    ///
    /// As for [`save_password_hash`](Self::save_password_hash).
    pub fn save_password_hash_if_unset(&self, hash: &str) -> Result<bool, SecretsError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.current()?.is_configured() {
            return Ok(false);
        }
        self.persist_password_hash(hash)?;
        Ok(true)
    }

    /// Caller holds `write_lock`.
    fn persist_password_hash(&self, hash: &str) -> Result<(), SecretsError> {
        let updated = self.current()?.with_password_hash(hash);
        file::write(&self.path, &updated.to_persisted())?;
        self.record.store(Some(Arc::new(updated)));
        info!(path = %self.path.display(), "operator password hash saved");
        Ok(())
    }

    fn current(&self) -> Result<Arc<SecretRecord>, SecretsError> {
        self.record.load_full().ok_or(SecretsError::NotInitialised)
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("path", &self.path)
            .field("ready", &self.is_ready())
            .field("configured", &self.is_configured())
            .finish()
    }
}
