//! `medvault` binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP).
//! 3. Load or generate the secret record.
//! 4. Build the session authority and the Axum router, then serve.

use anyhow::{Context, Result};
use tracing::info;

use medvault::auth::Authority;
use medvault::config::Config;
use medvault::secrets::SecretStore;
use medvault::server::{self, state::AppState};
use medvault::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "medvault starting"
    );

    // -----------------------------------------------------------------------
    // 3. Secrets
    // -----------------------------------------------------------------------
    let secrets = SecretStore::new(cfg.secrets_path());
    secrets
        .initialize()
        .with_context(|| format!("failed to initialise secrets at {}", secrets.path().display()))?;

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let authority = Authority::new(secrets.clone(), cfg.signing_algorithm()?, cfg.token_lifetime());
    let state = AppState::new(secrets, authority, cfg.min_password_length);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router).await?;

    telemetry::shutdown_telemetry();
    Ok(())
}
