//! Request extractors: bearer-token sessions and JSON bodies.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};
use common::ServiceError;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{error::ApiError, state::AppState};
use crate::auth::Claims;

/// [`Json`] whose rejection is a 400 with the usual `{code, detail}` body.
///
/// The detail names the kind of problem only; serde's message could echo
/// request values, and request bodies here carry passwords.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "request body rejected");
                Err(ServiceError::BadRequest(rejection_detail(&rejection).into()).into())
            }
        }
    }
}

fn rejection_detail(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "request body is missing a field or has the wrong type",
        JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "expected `Content-Type: application/json`",
        _ => "request body could not be read",
    }
}

/// A validated operator session.
///
/// Handlers that take this argument are only reached with a live token; every
/// other request is answered with a 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct Session(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .authority
            .require_session(bearer_token(&parts.headers))
            .map(Session)
            .map_err(ApiError::from)
    }
}

/// The token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
