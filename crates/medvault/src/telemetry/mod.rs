//! Structured logging with optional OpenTelemetry span export.
//!
//! Logs are JSON on stdout. When an OTLP endpoint is configured, spans are
//! also exported over OTLP/gRPC.
//!
//! # Telemetry invariants
//!
//! - **No key material, password, token, or decrypted field value** may appear
//!   in any span attribute or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
