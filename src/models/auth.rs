//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::UserRole;

/// Request for a sign-in challenge
#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub address: String,
}

/// Response containing the sign-in challenge
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub address: String,
    pub nonce: i64,
    pub message: String,
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub address: String,
    /// Hex-encoded 65-byte signature, with or without `0x` prefix
    pub signature: String,
}

/// Request to register with email and password
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_password")]
    pub password: String,
}

/// Request to log in with email and password
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Refresh token request (also used for logout)
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// Reset-password request body; the token itself travels as a query param
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(custom = "validate_password")]
    pub password: String,
}

/// Query param carrying a single-use token
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

/// A single issued token with its expiry
#[derive(Debug, Serialize, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Access/refresh token pair
#[derive(Debug, Serialize, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Response carrying only a rotated token pair
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub tokens: TokenPair,
}

/// Auth response: sanitized user plus a token pair
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// User response (sanitized for API; never carries the password hash)
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub nonce: Option<i64>,
    pub role: UserRole,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Password policy: at least 8 characters containing both a letter and a digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        return Err(ValidationError::new("password_too_short"));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ValidationError::new("password_needs_letter_and_digit"));
    }
    Ok(())
}
