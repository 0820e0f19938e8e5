//! Configuration loading and validation for the MedVault service.
//!
//! All values are read from environment variables at startup and are fixed for
//! the lifetime of the process. The process exits with a clear error message if
//! any value is invalid.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::SigningAlgorithm;

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path of the persisted secret record.
    #[serde(default = "default_secrets_file")]
    pub secrets_file: String,

    /// HMAC algorithm used to sign session tokens (`HS256`, `HS384`, `HS512`).
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,

    /// Session token lifetime in days.
    #[serde(default = "default_jwt_expire_days")]
    pub jwt_expire_days: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Minimum length of the operator password accepted by the setup ceremony.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// OTLP endpoint for span export. Export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_secrets_file() -> String {
    "/app/data/secrets.json".into()
}
fn default_jwt_algorithm() -> String {
    "HS256".into()
}
fn default_jwt_expire_days() -> u64 {
    7
}
fn default_listen_port() -> u16 {
    8000
}
fn default_min_password_length() -> usize {
    8
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Path of the secret file as a [`PathBuf`].
    pub fn secrets_path(&self) -> PathBuf {
        PathBuf::from(&self.secrets_file)
    }

    /// Parsed signing algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_ALGORITHM` names an unsupported algorithm.
    pub fn signing_algorithm(&self) -> Result<SigningAlgorithm> {
        self.jwt_algorithm
            .parse()
            .with_context(|| format!("JWT_ALGORITHM {:?} is not supported", self.jwt_algorithm))
    }

    /// Default session token lifetime.
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.jwt_expire_days.saturating_mul(24 * 60 * 60))
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.secrets_file, "SECRETS_FILE")?;
        self.signing_algorithm()?;

        if self.jwt_expire_days == 0 {
            anyhow::bail!("JWT_EXPIRE_DAYS must be > 0");
        }
        if self.min_password_length == 0 {
            anyhow::bail!("MIN_PASSWORD_LENGTH must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
