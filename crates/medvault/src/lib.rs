//! MedVault security core.
//!
//! - [`secrets`]: the persisted secret record and its in-process owner.
//! - [`crypto`]: authenticated field encryption for the persistence layer.
//! - [`auth`]: operator password hashing and signed session tokens.
//! - [`server`]: the setup ceremony, login, and the setup gate over HTTP.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod secrets;
pub mod server;
pub mod telemetry;
