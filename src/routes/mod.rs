//! Route definitions for the Driftmarket API

mod auth;

pub use auth::auth_routes;

use axum::{routing::get, Router};

use crate::handlers::health_check;
use crate::state::AppState;

/// Health and readiness routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
