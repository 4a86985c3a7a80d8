//! User directory for the Driftmarket backend
//!
//! Keyed lookup and creation of identity records; uniqueness is enforced by
//! the database's unique indexes.

mod service;

pub use service::{NewUser, UserService};
