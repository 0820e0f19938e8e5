//! [`SecretRecord`]: the in-memory form of the persisted secret file.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::SecretsError;
use crate::crypto::KEY_LEN;

/// Byte length of a freshly generated token-signing key (256 bits).
pub const SIGNING_KEY_LEN: usize = 32;

/// Heap buffer of secret key bytes, zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Wrap existing key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Fill `len` bytes from the OS CSPRNG.
    pub fn generate(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// On-disk JSON shape of the secret record.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub(super) struct PersistedRecord {
    /// Hex-encoded signing key.
    pub signing_key: String,
    /// Base64url (no padding) encoded encryption key.
    pub encryption_key: String,
    /// PHC-format password hash; `null` until setup completes.
    pub password_hash: Option<String>,
}

/// The loaded secret record.
#[derive(Clone)]
pub struct SecretRecord {
    signing_key: KeyMaterial,
    encryption_key: KeyMaterial,
    password_hash: Option<String>,
}

impl SecretRecord {
    /// Generate a brand-new record with fresh keys and no password.
    pub fn generate() -> Self {
        Self {
            signing_key: KeyMaterial::generate(SIGNING_KEY_LEN),
            encryption_key: KeyMaterial::generate(KEY_LEN),
            password_hash: None,
        }
    }

    pub fn signing_key(&self) -> &KeyMaterial {
        &self.signing_key
    }

    pub fn encryption_key(&self) -> &KeyMaterial {
        &self.encryption_key
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// `true` once a non-empty password hash is present.
    pub fn is_configured(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// Copy of this record with the password hash replaced; keys are unchanged.
    pub fn with_password_hash(&self, hash: impl Into<String>) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
            encryption_key: self.encryption_key.clone(),
            password_hash: Some(hash.into()),
        }
    }

    pub(super) fn to_persisted(&self) -> PersistedRecord {
        PersistedRecord {
            signing_key: hex::encode(self.signing_key.as_bytes()),
            encryption_key: URL_SAFE_NO_PAD.encode(self.encryption_key.as_bytes()),
            password_hash: self.password_hash.clone(),
        }
    }

    /// Decode and validate a record read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Corrupt`] if either key fails to decode or has the
    /// wrong length.
    pub(super) fn from_persisted(persisted: &PersistedRecord) -> Result<Self, SecretsError> {
        let signing_key = hex::decode(persisted.signing_key.trim())
            .map(KeyMaterial::new)
            .map_err(|e| SecretsError::Corrupt(format!("signing_key is not hex: {e}")))?;
        if signing_key.len() < SIGNING_KEY_LEN {
            return Err(SecretsError::Corrupt(format!(
                "signing_key must be at least {SIGNING_KEY_LEN} bytes, got {}",
                signing_key.len()
            )));
        }

        let encryption_key = URL_SAFE_NO_PAD
            .decode(persisted.encryption_key.trim())
            .map(KeyMaterial::new)
            .map_err(|e| SecretsError::Corrupt(format!("encryption_key is not base64url: {e}")))?;
        if encryption_key.len() != KEY_LEN {
            return Err(SecretsError::Corrupt(format!(
                "encryption_key must be {KEY_LEN} bytes, got {}",
                encryption_key.len()
            )));
        }

        let password_hash = persisted
            .password_hash
            .clone()
            .filter(|h| !h.trim().is_empty());

        Ok(Self {
            signing_key,
            encryption_key,
            password_hash,
        })
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("signing_key", &self.signing_key)
            .field("encryption_key", &self.encryption_key)
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_record_has_full_length_keys() {
        let record = SecretRecord::generate();
        assert_eq!(record.signing_key().len(), SIGNING_KEY_LEN);
        assert_eq!(record.encryption_key().len(), KEY_LEN);
        assert!(!record.is_configured());
    }

    #[test]
    fn generated_records_differ() {
        let a = SecretRecord::generate();
        let b = SecretRecord::generate();
        assert_ne!(a.signing_key(), b.signing_key());
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn persisted_form_decodes_back() {
        let record = SecretRecord::generate().with_password_hash("$argon2id$stub");
        let restored = SecretRecord::from_persisted(&record.to_persisted()).unwrap();
        assert_eq!(restored.signing_key(), record.signing_key());
        assert_eq!(restored.encryption_key(), record.encryption_key());
        assert_eq!(restored.password_hash(), Some("$argon2id$stub"));
    }

    #[test]
    fn short_encryption_key_is_corrupt() {
        let mut persisted = SecretRecord::generate().to_persisted();
        persisted.encryption_key = URL_SAFE_NO_PAD.encode([7u8; 16]);
        assert!(matches!(
            SecretRecord::from_persisted(&persisted),
            Err(SecretsError::Corrupt(_))
        ));
    }

    #[test]
    fn non_hex_signing_key_is_corrupt() {
        let mut persisted = SecretRecord::generate().to_persisted();
        persisted.signing_key = "not-hex".into();
        assert!(SecretRecord::from_persisted(&persisted).is_err());
    }

    #[test]
    fn empty_password_hash_counts_as_unconfigured() {
        let mut persisted = SecretRecord::generate().to_persisted();
        persisted.password_hash = Some(String::new());
        let record = SecretRecord::from_persisted(&persisted).unwrap();
        assert!(!record.is_configured());
        assert_eq!(record.password_hash(), None);
    }

    #[test]
    fn debug_output_is_redacted() {
        let record = SecretRecord::generate();
        let hex_key = hex::encode(record.signing_key().as_bytes());
        let debug = format!("{record:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&hex_key));
    }
}
