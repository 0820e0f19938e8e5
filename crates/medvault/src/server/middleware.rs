//! Axum middleware applied to the router.
//!
//! Request tracing, timeout enforcement, and response compression come from
//! `tower-http`; the setup gate lives here.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::ServiceError;
use tracing::debug;

use super::{error::ApiError, state::AppState};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Refuse application routes with 503 `setup_required` until the operator
/// password has been set.
///
/// Evaluated on every request, so the gate opens as soon as setup completes.
pub async fn setup_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_gated(path) && !state.secrets.is_configured() {
        debug!(path, "request refused until setup completes");
        return ApiError(ServiceError::SetupRequired).into_response();
    }
    next.run(request).await
}

/// `/api/...` paths other than the setup endpoints.
fn is_gated(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api") else {
        return false;
    };
    if !(rest.is_empty() || rest.starts_with('/')) {
        return false;
    }
    !(rest == "/setup" || rest.starts_with("/setup/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_covers_application_routes_only() {
        assert!(is_gated("/api/auth/login"));
        assert!(is_gated("/api/patients/3"));
        assert!(is_gated("/api"));
        assert!(is_gated("/api/setupx"));

        assert!(!is_gated("/api/setup"));
        assert!(!is_gated("/api/setup/status"));
        assert!(!is_gated("/health"));
        assert!(!is_gated("/"));
        assert!(!is_gated("/apiary"));
    }
}
