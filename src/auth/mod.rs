//! Authentication module for the Driftmarket backend
//!
//! Provides both authentication flows:
//! - Wallet sign-in: challenge-response with per-account nonces and EIP-191
//!   personal signatures
//! - Credential sign-in: email + bcrypt password hash
//!
//! JWT generation/validation lives in `jwt`, the persisted token lifecycle
//! in `crate::tokens`.

pub mod address;
pub mod challenge;
pub mod crypto;
pub mod jwt;
pub mod nonce;
pub mod password;
mod service;

pub use address::{is_valid_address, normalize_address};
pub use challenge::build_challenge;
pub use crypto::verify_personal_signature;
pub use jwt::{generate_token, verify_token, Claims};
pub use nonce::{NonceSource, ThreadRngNonceSource};
pub use service::{AuthError, AuthService};
