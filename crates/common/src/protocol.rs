//! Request and response types exchanged with the browser client.
//!
//! All types are serialised as JSON over the HTTP API.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Setup ceremony
// ---------------------------------------------------------------------------

/// Response body for `GET /api/setup/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupStatusResponse {
    /// `true` once an operator password has been set.
    pub configured: bool,
}

/// Request body for `POST /api/setup`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SetupRequest {
    /// The operator password to set.
    pub password: String,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Request body for `POST /api/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

// Passwords never reach a log line through a stray `{:?}`.
impl std::fmt::Debug for SetupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SetupRequest { password: [REDACTED] }")
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LoginRequest { password: [REDACTED] }")
    }
}

/// Successful response body for `POST /api/setup` and `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed session token to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    /// Wrap a freshly issued session token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".into(),
        }
    }
}

/// Response body for `GET /api/auth/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Response body for `POST /api/auth/logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"unauthorized"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub detail: String,
    /// Present and `true` only when the setup gate refused the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_required: Option<bool>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and detail message.
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
            setup_required: None,
        }
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        let mut body = ErrorResponse::new(err.code(), err.detail());
        if matches!(err, ServiceError::SetupRequired) {
            body.setup_required = Some(true);
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the secret record is loaded into memory.
    pub secrets_ready: bool,
    /// Whether the setup ceremony has completed.
    pub configured: bool,
}
