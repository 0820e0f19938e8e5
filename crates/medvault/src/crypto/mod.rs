//! AES-256-GCM-SIV field encryption.
//!
//! This module is free of HTTP and persistence-layer dependencies. The
//! persistence layer calls [`FieldCipher::to_storage`] / [`FieldCipher::from_storage`]
//! (or the record-level [`seal_record`] / [`open_record`]) at its read/write edge.
//!
//! # Ciphertext format
//!
//! ```text
//! v1.<base64url-no-pad(nonce)>.<base64url-no-pad(ciphertext+tag)>
//! ```
//!
//! The `v1` prefix leaves room for a future algorithm change without breaking
//! existing ciphertext.

pub mod cipher;
pub mod field;
pub mod records;

pub use cipher::{CipherError, KEY_LEN};
pub use field::{DecryptionError, FieldCipher, RekeyError, DECRYPTION_PLACEHOLDER};
pub use records::{matches_any, open_record, seal_record};
