//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::Conflict`] → 409
/// - [`ServiceError::SetupRequired`] → 503
/// - [`ServiceError::Unavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed, e.g. a setup password below the minimum length.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Wrong password, or a missing, forged, expired, or malformed session token.
    ///
    /// The message is deliberately generic; callers never learn which check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The one-time setup ceremony has already been completed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No operator password has been set yet; only setup endpoints are open.
    #[error("setup required")]
    SetupRequired,

    /// The secret store is not loaded or is temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred (e.g. the secret file could not be written).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Conflict(_) => 409,
            ServiceError::SetupRequired => 503,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::SetupRequired => "setup_required",
            ServiceError::Unavailable(_) => "service_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Human-readable detail that is safe to expose to callers.
    pub fn detail(&self) -> String {
        match self {
            ServiceError::BadRequest(m)
            | ServiceError::Unauthorized(m)
            | ServiceError::Conflict(m)
            | ServiceError::Unavailable(m) => m.clone(),
            ServiceError::SetupRequired => "Setup required".into(),
            // Internal details stay in the logs.
            ServiceError::Internal(_) => "internal server error".into(),
        }
    }
}
