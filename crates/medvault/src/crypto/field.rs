//! [`FieldCipher`]: text-in, text-out encryption for persisted attributes.
//!
//! Two read paths exist on purpose:
//!
//! - [`FieldCipher::decrypt`] is strict and returns a [`DecryptionError`].
//! - [`FieldCipher::from_storage`] is the persistence adapter; it turns a failure
//!   into [`DECRYPTION_PLACEHOLDER`] so one bad row cannot fail a whole listing.

use thiserror::Error;
use tracing::warn;

use super::cipher::{self, CipherError, EncryptedField};
use crate::secrets::{KeyMaterial, SecretStore, SecretsError};

/// Value handed to application code when a stored ciphertext cannot be decrypted.
pub const DECRYPTION_PLACEHOLDER: &str = "[decryption error]";

/// Why a stored value could not be decrypted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptionError {
    /// Not a `v1.<nonce>.<ciphertext>` value at all.
    #[error("value is not a v1 encrypted field")]
    Malformed,

    /// The authentication tag did not verify: wrong key, corruption, or tampering.
    #[error("authentication failed: wrong key or tampered ciphertext")]
    Authentication,

    /// Authentication passed but the plaintext is not UTF-8 text.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Failure while moving a value from one key to another.
#[derive(Debug, Error)]
pub enum RekeyError {
    #[error("decrypting under the old key failed: {0}")]
    Decrypt(#[from] DecryptionError),

    #[error("encrypting under the new key failed: {0}")]
    Encrypt(#[from] CipherError),
}

/// Encrypts and decrypts text values under one fixed key.
///
/// The cipher is a pure function of the key it was built with, so rotation
/// tooling can hold an old and a new instance side by side.
#[derive(Clone)]
pub struct FieldCipher {
    key: KeyMaterial,
}

impl FieldCipher {
    /// Build a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] unless `key` is
    /// [`KEY_LEN`](super::KEY_LEN) bytes.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != super::KEY_LEN {
            return Err(CipherError::InvalidKeyLength);
        }
        Ok(Self {
            key: KeyMaterial::new(key.to_vec()),
        })
    }

    /// Build a cipher from the store's current encryption key.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::NotInitialised`] before the store is loaded.
    pub fn from_store(store: &SecretStore) -> Result<Self, SecretsError> {
        let key = store.encryption_key()?;
        Self::new(key.as_bytes())
            .map_err(|e| SecretsError::Corrupt(format!("encryption key unusable: {e}")))
    }

    /// Encrypt `plaintext` to its printable `v1.` form.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::AeadFailure`] on an internal AEAD error.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        cipher::seal(plaintext.as_bytes(), self.key.as_bytes()).map(|field| field.to_string())
    }

    /// Decrypt a `v1.` value, failing loudly on any problem.
    ///
    /// # Errors
    ///
    /// See [`DecryptionError`].
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptionError> {
        let field: EncryptedField = ciphertext
            .parse()
            .map_err(|_| DecryptionError::Malformed)?;
        let bytes = cipher::open(&field, self.key.as_bytes())
            .map_err(|_| DecryptionError::Authentication)?;
        String::from_utf8(bytes).map_err(|_| DecryptionError::InvalidUtf8)
    }

    /// Write-edge adapter: encrypt a value on its way to storage.
    ///
    /// `None` passes through untouched.
    ///
    /// # Errors
    ///
    /// Propagates [`FieldCipher::encrypt`] failures; a value is never stored in
    /// plaintext as a fallback.
    pub fn to_storage(&self, value: Option<&str>) -> Result<Option<String>, CipherError> {
        value.map(|v| self.encrypt(v)).transpose()
    }

    /// Read-edge adapter: decrypt a stored value for application code.
    ///
    /// `None` passes through untouched. A value that fails to decrypt becomes
    /// [`DECRYPTION_PLACEHOLDER`].
    pub fn from_storage(&self, stored: Option<&str>) -> Option<String> {
        stored.map(|v| match self.decrypt(v) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(reason = %e, "stored field could not be decrypted; returning placeholder");
                DECRYPTION_PLACEHOLDER.to_owned()
            }
        })
    }

    /// Re-encrypt a value from this cipher's key to `target`'s key.
    ///
    /// Used by the manual key-rotation procedure; nothing calls it at runtime.
    ///
    /// # Errors
    ///
    /// Fails if the value does not decrypt under this key.
    pub fn rekey(&self, ciphertext: &str, target: &FieldCipher) -> Result<String, RekeyError> {
        let plaintext = zeroize::Zeroizing::new(self.decrypt(ciphertext)?);
        Ok(target.encrypt(&plaintext)?)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;

    fn cipher() -> FieldCipher {
        FieldCipher::new(KeyMaterial::generate(KEY_LEN).as_bytes()).unwrap()
    }

    #[test]
    fn round_trip() {
        let c = cipher();
        let long = "x".repeat(10_000);
        for plaintext in ["", "Dr. Osei, cardiology", "ünïcödé 💊", long.as_str()] {
            let ct = c.encrypt(plaintext).unwrap();
            assert_eq!(c.decrypt(&ct).unwrap(), plaintext);
        }
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let c = cipher();
        assert_ne!(c.encrypt("metformin 500mg").unwrap(), c.encrypt("metformin 500mg").unwrap());
    }

    #[test]
    fn ciphertext_does_not_contain_plaintext() {
        let c = cipher();
        let ct = c.encrypt("allergic to penicillin").unwrap();
        assert!(!ct.contains("penicillin"));
    }

    #[test]
    fn empty_plaintext_is_distinguishable_from_failure() {
        let c = cipher();
        let ct = c.encrypt("").unwrap();
        assert_eq!(c.decrypt(&ct), Ok(String::new()));
        assert_eq!(c.from_storage(Some(&ct)).as_deref(), Some(""));
    }

    #[test]
    fn wrong_key_is_a_decryption_error() {
        let ct = cipher().encrypt("notes").unwrap();
        assert_eq!(cipher().decrypt(&ct), Err(DecryptionError::Authentication));
    }

    #[test]
    fn corrupted_bytes_are_a_decryption_error() {
        let c = cipher();
        let mut ct = c.encrypt("notes").unwrap();
        // Swap the last base64 character for a different one.
        let last = ct.pop().unwrap();
        ct.push(if last == 'A' { 'B' } else { 'A' });
        assert!(c.decrypt(&ct).is_err());
    }

    #[test]
    fn plaintext_in_column_is_malformed() {
        assert_eq!(cipher().decrypt("legacy plain text"), Err(DecryptionError::Malformed));
    }

    #[test]
    fn adapter_passes_none_through() {
        let c = cipher();
        assert_eq!(c.to_storage(None).unwrap(), None);
        assert_eq!(c.from_storage(None), None);
    }

    #[test]
    fn adapter_round_trip() {
        let c = cipher();
        let stored = c.to_storage(Some("annual checkup")).unwrap().unwrap();
        assert!(stored.starts_with("v1."));
        assert_eq!(c.from_storage(Some(&stored)).as_deref(), Some("annual checkup"));
    }

    #[test]
    fn adapter_read_yields_placeholder_on_wrong_key() {
        let stored = cipher().to_storage(Some("annual checkup")).unwrap().unwrap();
        assert_eq!(cipher().from_storage(Some(&stored)).as_deref(), Some(DECRYPTION_PLACEHOLDER));
    }

    #[test]
    fn adapter_read_yields_placeholder_on_garbage() {
        assert_eq!(cipher().from_storage(Some("v1.zz.zz")).as_deref(), Some(DECRYPTION_PLACEHOLDER));
    }

    #[test]
    fn rekey_moves_value_to_new_key() {
        let old = cipher();
        let new = cipher();
        let ct = old.encrypt("take with food").unwrap();

        let moved = old.rekey(&ct, &new).unwrap();

        assert_eq!(new.decrypt(&moved).unwrap(), "take with food");
        assert!(old.decrypt(&moved).is_err());
    }

    #[test]
    fn rekey_fails_for_foreign_ciphertext() {
        let ct = cipher().encrypt("x").unwrap();
        assert!(matches!(cipher().rekey(&ct, &cipher()), Err(RekeyError::Decrypt(_))));
    }

    #[test]
    fn new_rejects_short_key() {
        assert!(matches!(FieldCipher::new(&[1u8; 8]), Err(CipherError::InvalidKeyLength)));
    }

    #[test]
    fn from_store_requires_initialised_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SecretStore::new(dir.path().join("secrets.json"));
        assert!(FieldCipher::from_store(&store).is_err());

        store.initialize().unwrap();
        let c = FieldCipher::from_store(&store).unwrap();
        let again = FieldCipher::from_store(&store).unwrap();
        let ct = c.encrypt("shared key").unwrap();
        assert_eq!(again.decrypt(&ct).unwrap(), "shared key");
    }
}
