//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/auth/web3/challenge", post(auth::request_challenge))
        .route("/v1/auth/web3/verify", post(auth::verify_signature))
        .route("/v1/auth/refresh-tokens", post(auth::refresh_tokens))
        .route("/v1/auth/logout", post(auth::logout))
        .route("/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/v1/auth/reset-password", post(auth::reset_password))
        .route(
            "/v1/auth/send-verification-email",
            post(auth::send_verification_email),
        )
        .route("/v1/auth/verify-email", post(auth::verify_email))
        .route("/v1/auth/me", get(auth::get_current_user))
}
