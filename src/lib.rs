//! Driftmarket Backend Library
//!
//! Exports the core modules for the Driftmarket authentication backend:
//! wallet (challenge/signature) and email/password sign-in, plus the JWT
//! token lifecycle.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod tokens;
pub mod users;
