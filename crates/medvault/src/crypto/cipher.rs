//! AES-256-GCM-SIV encryption and decryption of individual values.
//!
//! Every call to [`seal`] draws a fresh 96-bit nonce from the OS CSPRNG, so the
//! same plaintext encrypted twice yields two different ciphertexts and stored
//! rows never reveal which values are equal.

use std::fmt;
use std::str::FromStr;

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Prefix that appears at the start of every encrypted value.
pub const VERSION_PREFIX: &str = "v1";

/// A parsed encrypted value.
///
/// The text form is `v1.<base64url(nonce)>.<base64url(ciphertext+tag)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Raw nonce bytes.
    pub nonce: [u8; NONCE_LEN],
    /// Raw ciphertext + authentication tag bytes.
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(self.nonce),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
        )
    }
}

impl FromStr for EncryptedField {
    type Err = CipherError;

    /// Parse the `v1.<nonce>.<ciphertext>` text form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        let (Some(version), Some(nonce_b64), Some(ct_b64)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CipherError::InvalidFormat);
        };
        if version != VERSION_PREFIX {
            return Err(CipherError::InvalidFormat);
        }

        let nonce: [u8; NONCE_LEN] = URL_SAFE_NO_PAD
            .decode(nonce_b64)
            .map_err(|_| CipherError::InvalidFormat)?
            .try_into()
            .map_err(|_| CipherError::InvalidFormat)?;

        let ciphertext = URL_SAFE_NO_PAD
            .decode(ct_b64)
            .map_err(|_| CipherError::InvalidFormat)?;
        if ciphertext.len() < TAG_LEN {
            return Err(CipherError::InvalidFormat);
        }

        Ok(Self { nonce, ciphertext })
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// AES-GCM-SIV encryption failed, or decryption failed authentication.
    #[error("aead operation failed")]
    AeadFailure,

    /// The encrypted value does not match the `v1.<nonce>.<ciphertext>` form.
    #[error("invalid encrypted field format")]
    InvalidFormat,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
pub fn seal(plaintext: &[u8], key: &[u8]) -> Result<EncryptedField, CipherError> {
    let cipher = build_cipher(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    Ok(EncryptedField { nonce, ciphertext })
}

/// Decrypt and authenticate `field` under `key`.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// Returns [`CipherError::AeadFailure`] if authentication fails (wrong key or tampered data).
pub fn open(field: &EncryptedField, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;
    cipher
        .decrypt(Nonce::from_slice(&field.nonce), field.ciphertext.as_ref())
        .map_err(|_| CipherError::AeadFailure)
}

fn build_cipher(key: &[u8]) -> Result<Aes256GcmSiv, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }
    Aes256GcmSiv::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn seal_open_round_trip() {
        let key = random_key();
        let sealed = seal(b"follow-up in two weeks", &key).unwrap();
        assert_eq!(open(&sealed, &key).unwrap(), b"follow-up in two weeks");
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let key = random_key();
        let a = seal(b"same", &key).unwrap();
        let b = seal(b"same", &key).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = seal(b"secret", &random_key()).unwrap();
        assert_eq!(open(&sealed, &random_key()), Err(CipherError::AeadFailure));
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert_eq!(seal(b"x", &[0u8; 16]), Err(CipherError::InvalidKeyLength));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = random_key();
        let mut sealed = seal(b"tamper me", &key).unwrap();
        sealed.ciphertext[0] ^= 0xFF;
        assert!(open(&sealed, &key).is_err());
    }

    #[test]
    fn text_form_parses_back() {
        let sealed = seal(b"hello", &random_key()).unwrap();
        let text = sealed.to_string();
        assert!(text.starts_with("v1."));
        assert_eq!(text.parse::<EncryptedField>().unwrap(), sealed);
    }

    #[test]
    fn parse_rejects_bad_prefix() {
        assert!("v2.abc.def".parse::<EncryptedField>().is_err());
    }

    #[test]
    fn parse_rejects_too_few_parts() {
        assert!("v1.abc".parse::<EncryptedField>().is_err());
    }

    #[test]
    fn parse_rejects_bad_base64() {
        assert!("v1.!!!.abc".parse::<EncryptedField>().is_err());
    }

    #[test]
    fn parse_rejects_truncated_tag() {
        let nonce = URL_SAFE_NO_PAD.encode([0u8; NONCE_LEN]);
        let short = URL_SAFE_NO_PAD.encode([0u8; TAG_LEN - 1]);
        assert_eq!(
            format!("v1.{nonce}.{short}").parse::<EncryptedField>(),
            Err(CipherError::InvalidFormat)
        );
    }
}
