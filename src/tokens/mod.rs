//! Token lifecycle for the Driftmarket backend
//!
//! Issues access/refresh pairs and single-use reset/verify tokens, rotates
//! refresh tokens, and blacklists anything that must never validate again.

mod service;
mod store;

pub use service::{TokenService, TokenTtls};
pub use store::{PgTokenStore, TokenStore};
