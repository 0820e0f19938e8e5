//! Axum HTTP surface: setup ceremony, login, session check, and the setup gate.
//!
//! # Responsibilities
//! - Define the router with all routes and shared middleware.
//! - Refuse application routes until setup completes ([`middleware::setup_gate`]).
//! - Map core errors onto HTTP statuses ([`error::ApiError`]).

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
