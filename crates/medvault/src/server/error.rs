//! Conversion of core errors into HTTP responses.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};
use tracing::error;

use crate::auth::AuthError;
use crate::secrets::SecretsError;

const INVALID_PASSWORD: &str = "Invalid password";
const INVALID_SESSION: &str = "Invalid or expired token";

/// A [`ServiceError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let mapped = match err {
            AuthError::InvalidPassword => ServiceError::Unauthorized(INVALID_PASSWORD.into()),
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                ServiceError::Unauthorized(INVALID_SESSION.into())
            }
            AuthError::AlreadyConfigured => ServiceError::Conflict(
                "Setup already completed. Use /api/auth/login to sign in.".into(),
            ),
            AuthError::Secrets(SecretsError::NotInitialised) => {
                ServiceError::Unavailable("secrets are not loaded".into())
            }
            AuthError::Secrets(e) => ServiceError::Internal(e.to_string()),
            AuthError::Hashing(msg) => ServiceError::Internal(msg),
        };
        Self(mapped)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if let ServiceError::Internal(msg) = &self.0 {
            error!(error = %msg, "request failed");
        }

        let mut response = (status, Json(ErrorResponse::from(&self.0))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
