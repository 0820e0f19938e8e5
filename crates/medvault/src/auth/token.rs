//! Compact HMAC-signed session tokens (JWS compact serialisation).
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(hmac(header "." claims))
//! ```
//!
//! Only symmetric HMAC algorithms are accepted, and the header algorithm must
//! equal the configured one, so `"alg": "none"` and algorithm-swap tokens are
//! rejected before the signature is even computed.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;

/// Internal reasons a token was rejected.
///
/// These stay in logs; callers only ever see a single unauthorized signal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed: {0}")]
    Malformed(&'static str),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token algorithm {found} does not match configured {expected}")]
    AlgorithmMismatch { expected: &'static str, found: String },

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token subject is not the operator")]
    WrongSubject,

    #[error("signing key was rejected by the MAC")]
    InvalidKey,
}

/// HMAC algorithm used to sign session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl SigningAlgorithm {
    /// The JOSE `alg` header value.
    pub fn as_str(self) -> &'static str {
        match self {
            SigningAlgorithm::Hs256 => "HS256",
            SigningAlgorithm::Hs384 => "HS384",
            SigningAlgorithm::Hs512 => "HS512",
        }
    }

    fn sign(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, TokenError> {
        match self {
            SigningAlgorithm::Hs256 => mac::<Hmac<Sha256>>(key, message),
            SigningAlgorithm::Hs384 => mac::<Hmac<Sha384>>(key, message),
            SigningAlgorithm::Hs512 => mac::<Hmac<Sha512>>(key, message),
        }
    }

    fn verify(self, key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), TokenError> {
        match self {
            SigningAlgorithm::Hs256 => verify_mac::<Hmac<Sha256>>(key, message, signature),
            SigningAlgorithm::Hs384 => verify_mac::<Hmac<Sha384>>(key, message, signature),
            SigningAlgorithm::Hs512 => verify_mac::<Hmac<Sha512>>(key, message, signature),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::Hs256),
            "HS384" => Ok(SigningAlgorithm::Hs384),
            "HS512" => Ok(SigningAlgorithm::Hs512),
            _ => Err(TokenError::UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

fn mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| TokenError::InvalidKey)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify_mac<M: Mac + KeyInit>(
    key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), TokenError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| TokenError::InvalidKey)?;
    mac.update(message);
    // Constant-time comparison.
    mac.verify_slice(signature)
        .map_err(|_| TokenError::InvalidSignature)
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject; always the operator identifier for valid tokens.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. The token is invalid from this instant on.
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Sign `claims` with `key`.
///
/// # Errors
///
/// Returns [`TokenError::InvalidKey`] if the MAC rejects the key.
pub fn encode(claims: &Claims, algorithm: SigningAlgorithm, key: &[u8]) -> Result<String, TokenError> {
    let header = Header {
        alg: algorithm.as_str().to_owned(),
        typ: Some("JWT".into()),
    };
    let header_json = serde_json::to_vec(&header).map_err(|_| TokenError::Malformed("header"))?;
    let claims_json = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed("claims"))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = algorithm.sign(key, signing_input.as_bytes())?;
    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify structure, algorithm, and signature, then return the claims.
///
/// Expiry and subject are *not* checked here.
///
/// # Errors
///
/// Returns the first [`TokenError`] encountered.
pub fn decode(token: &str, algorithm: SigningAlgorithm, key: &[u8]) -> Result<Claims, TokenError> {
    let (signing_input, signature_b64) = token
        .rsplit_once('.')
        .ok_or(TokenError::Malformed("expected three segments"))?;
    let (header_b64, claims_b64) = signing_input
        .split_once('.')
        .ok_or(TokenError::Malformed("expected three segments"))?;
    if claims_b64.contains('.') {
        return Err(TokenError::Malformed("expected three segments"));
    }

    let header: Header = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(TokenError::Malformed("header"))?;
    if header.alg != algorithm.as_str() {
        return Err(TokenError::AlgorithmMismatch {
            expected: algorithm.as_str(),
            found: header.alg,
        });
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed("signature"))?;
    algorithm.verify(key, signing_input.as_bytes(), &signature)?;

    URL_SAFE_NO_PAD
        .decode(claims_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(TokenError::Malformed("claims"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn claims() -> Claims {
        Claims {
            sub: "medvault".into(),
            iat: 1_700_000_000,
            exp: 1_700_604_800,
        }
    }

    #[test]
    fn encode_decode_each_algorithm() {
        for alg in [SigningAlgorithm::Hs256, SigningAlgorithm::Hs384, SigningAlgorithm::Hs512] {
            let token = encode(&claims(), alg, KEY).unwrap();
            assert_eq!(token.matches('.').count(), 2);
            assert_eq!(decode(&token, alg, KEY).unwrap(), claims());
        }
    }

    #[test]
    fn token_is_url_safe() {
        let token = encode(&claims(), SigningAlgorithm::Hs256, KEY).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }

    #[test]
    fn other_key_fails_signature() {
        let token = encode(&claims(), SigningAlgorithm::Hs256, KEY).unwrap();
        let other = b"ffffffffffffffffffffffffffffffff";
        assert_eq!(
            decode(&token, SigningAlgorithm::Hs256, other),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_claims_fail_signature() {
        let token = encode(&claims(), SigningAlgorithm::Hs256, KEY).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                exp: i64::MAX,
                ..claims()
            })
            .unwrap(),
        );
        parts[1] = &forged;
        assert_eq!(
            decode(&parts.join("."), SigningAlgorithm::Hs256, KEY),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let token = encode(&claims(), SigningAlgorithm::Hs512, KEY).unwrap();
        assert!(matches!(
            decode(&token, SigningAlgorithm::Hs256, KEY),
            Err(TokenError::AlgorithmMismatch { .. })
        ));
    }

    #[test]
    fn alg_none_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims()).unwrap());
        let token = format!("{header}.{body}.");
        assert!(decode(&token, SigningAlgorithm::Hs256, KEY).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for bad in ["", "abc", "a.b", "a.b.c.d", "!!!.@@@.###"] {
            assert!(
                matches!(
                    decode(bad, SigningAlgorithm::Hs256, KEY),
                    Err(TokenError::Malformed(_))
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn algorithm_parsing() {
        assert_eq!("HS256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Hs256);
        assert_eq!("hs512".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Hs512);
        assert!("RS256".parse::<SigningAlgorithm>().is_err());
        assert!("none".parse::<SigningAlgorithm>().is_err());
    }
}
