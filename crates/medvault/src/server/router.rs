//! Axum router construction.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// The setup gate wraps the fallback too, so unknown `/api/` paths answer 503
/// until setup completes and 404 afterwards.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/setup/status", get(handlers::setup_status))
        .route("/api/setup", post(handlers::complete_setup))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/verify", get(handlers::verify))
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::setup_gate))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authority, SigningAlgorithm};
    use crate::secrets::SecretStore;
    use axum::{
        body::Body,
        http::{header, Request},
        response::Response,
    };
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn ready_state(dir: &TempDir) -> AppState {
        let secrets = SecretStore::new(dir.path().join("secrets.json"));
        secrets.initialize().unwrap();
        let authority = Authority::new(
            secrets.clone(),
            SigningAlgorithm::Hs256,
            Duration::from_secs(3600),
        );
        AppState::new(secrets, authority, 8)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::default());
        let resp = app.oneshot(get_req("/unknown")).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let app = build(AppState::default());
        let resp = app.oneshot(get_req("/health")).await.unwrap();
        // 503 because the secret store was never initialised.
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn health_ok_once_secrets_load() {
        let dir = TempDir::new().unwrap();
        let resp = build(ready_state(&dir)).oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["secrets_ready"], true);
        assert_eq!(body["configured"], false);
    }

    #[tokio::test]
    async fn gate_blocks_application_routes_before_setup() {
        let dir = TempDir::new().unwrap();
        let app = build(ready_state(&dir));

        for uri in ["/api/auth/verify", "/api/patients"] {
            let resp = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(resp.status(), 503, "{uri}");
            let body = json_body(resp).await;
            assert_eq!(body["setup_required"], true);
            assert_eq!(body["detail"], "Setup required");
        }

        let resp = app
            .clone()
            .oneshot(post_json("/api/auth/login", serde_json::json!({"password": "whatever1"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);

        let resp = app.oneshot(get_req("/api/setup/status")).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn short_setup_password_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = ready_state(&dir);
        let resp = build(state.clone())
            .oneshot(post_json("/api/setup", serde_json::json!({"password": "short"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert!(!state.secrets.is_configured());
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let dir = TempDir::new().unwrap();
        let app = build(ready_state(&dir));

        let missing_field = post_json("/api/setup", serde_json::json!({"pw": "longenoughpw"}));
        let bad_syntax = Request::builder()
            .method("POST")
            .uri("/api/setup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"password\":"))
            .unwrap();
        let no_content_type = Request::builder()
            .method("POST")
            .uri("/api/setup")
            .body(Body::from(r#"{"password":"longenoughpw"}"#))
            .unwrap();

        for req in [missing_field, bad_syntax, no_content_type] {
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), 400);
            assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
            let body = json_body(resp).await;
            assert_eq!(body["code"], "bad_request");
            assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
        }
    }

    #[tokio::test]
    async fn setup_write_failure_is_a_500() {
        let dir = TempDir::new().unwrap();
        let state = ready_state(&dir);
        std::fs::create_dir(dir.path().join(".secrets.json.tmp")).unwrap();

        let resp = build(state.clone())
            .oneshot(post_json("/api/setup", serde_json::json!({"password": "longenoughpw"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body = json_body(resp).await;
        assert_eq!(body["code"], "internal_error");
        assert_eq!(body["detail"], "internal server error");
        assert!(!state.secrets.is_configured());
    }

    #[tokio::test]
    async fn gate_opens_after_setup() {
        let dir = TempDir::new().unwrap();
        let state = ready_state(&dir);
        let app = build(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json("/api/setup", serde_json::json!({"password": "longenoughpw"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let token = json_body(resp).await["access_token"]
            .as_str()
            .unwrap()
            .to_owned();

        let resp = app.clone().oneshot(get_req("/api/patients")).await.unwrap();
        assert_eq!(resp.status(), 404);

        let resp = app.clone().oneshot(get_req("/api/auth/verify")).await.unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let req = Request::builder()
            .uri("/api/auth/verify")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(json_body(resp).await["valid"], true);

        let resp = app
            .oneshot(post_json("/api/auth/login", serde_json::json!({"password": "wrongpassword"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(json_body(resp).await["detail"], "Invalid password");
    }
}
