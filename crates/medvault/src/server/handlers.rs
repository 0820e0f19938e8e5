//! Axum request handlers for the setup, auth, and health endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{
        ErrorResponse, HealthResponse, LoginRequest, LogoutResponse, SetupRequest,
        SetupStatusResponse, TokenResponse, VerifyResponse,
    },
    ServiceError,
};
use tracing::info;

use super::{
    error::ApiError,
    extract::{ApiJson, Session},
    state::AppState,
};
use crate::auth::{AuthError, Authority};

/// Run an Argon2-bound authority call off the async workers.
async fn blocking<F>(state: &AppState, f: F) -> Result<String, ApiError>
where
    F: FnOnce(&Authority) -> Result<String, AuthError> + Send + 'static,
{
    let authority = state.authority.clone();
    let token = tokio::task::spawn_blocking(move || f(&authority))
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))??;
    Ok(token)
}

/// `GET /health`: readiness of the secret store.
///
/// Returns `200 OK` once the secret record is loaded, `503` before that.
pub async fn health(State(state): State<AppState>) -> Response {
    let secrets_ready = state.secrets.is_ready();
    let (status_code, status_str) = if secrets_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        secrets_ready,
        configured: state.secrets.is_configured(),
    };
    (status_code, Json(body)).into_response()
}

/// `GET /api/setup/status`
pub async fn setup_status(State(state): State<AppState>) -> Json<SetupStatusResponse> {
    Json(state.authority.setup_status())
}

/// `POST /api/setup`: one-time ceremony that sets the operator password and
/// returns a session token.
pub async fn complete_setup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SetupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let min = state.min_password_length;
    if req.password.chars().count() < min {
        return Err(ServiceError::BadRequest(format!(
            "password must be at least {min} characters"
        ))
        .into());
    }

    let token = blocking(&state, move |authority| authority.complete_setup(&req.password)).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = blocking(&state, move |authority| authority.login(&req.password)).await?;
    info!("operator logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

/// `POST /api/auth/logout`
///
/// Sessions are stateless; the client discards its token.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        detail: "Logged out".into(),
    })
}

/// `GET /api/auth/verify`: 200 only for a live session.
pub async fn verify(Session(_claims): Session) -> Json<VerifyResponse> {
    Json(VerifyResponse { valid: true })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
