//! Middleware for the Driftmarket API

pub mod auth;

pub use auth::AuthenticatedUser;
