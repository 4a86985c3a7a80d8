//! JWT token generation and validation
//!
//! One claims shape covers all four token kinds; the `token_type` claim
//! keeps an access token from standing in for a refresh token (or a
//! single-use token) and vice versa.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{TokenKind, UserRole};

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("expected a {expected} token, got {actual}")]
    WrongKind { expected: &'static str, actual: String },
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User role
    pub role: String,
    /// Unique token ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token kind (access, refresh, reset_password, verify_email)
    pub token_type: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))
    }

    /// Require the claims to carry the given kind.
    pub fn require_kind(&self, kind: TokenKind) -> Result<(), JwtError> {
        if self.token_type == kind.as_str() {
            Ok(())
        } else {
            Err(JwtError::WrongKind {
                expected: kind.as_str(),
                actual: self.token_type.clone(),
            })
        }
    }
}

/// Generate a signed token of the given kind.
///
/// Returns the encoded token along with its expiry instant.
pub fn generate_token(
    user_id: Uuid,
    role: UserRole,
    kind: TokenKind,
    secret: &str,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>), JwtError> {
    let now = Utc::now();
    let expires_at = now + ttl;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        token_type: kind.as_str().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

    Ok((token, expires_at))
}

/// Verify a token's signature and expiry and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::InvalidToken(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    #[test]
    fn test_generate_and_verify_access_token() {
        let user_id = Uuid::new_v4();
        let (token, expires_at) = generate_token(
            user_id,
            UserRole::User,
            TokenKind::Access,
            SECRET,
            Duration::minutes(30),
        )
        .unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, "user");
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(claims.require_kind(TokenKind::Access).is_ok());
    }

    #[test]
    fn test_kind_is_enforced() {
        let (token, _) = generate_token(
            Uuid::new_v4(),
            UserRole::User,
            TokenKind::Refresh,
            SECRET,
            Duration::days(30),
        )
        .unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        let err = claims.require_kind(TokenKind::Access).unwrap_err();
        assert!(matches!(err, JwtError::WrongKind { .. }));
    }

    #[test]
    fn test_expired_token_rejected() {
        let (token, _) = generate_token(
            Uuid::new_v4(),
            UserRole::User,
            TokenKind::Access,
            SECRET,
            Duration::seconds(-120),
        )
        .unwrap();

        let err = verify_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, JwtError::TokenExpired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = generate_token(
            Uuid::new_v4(),
            UserRole::User,
            TokenKind::Access,
            SECRET,
            Duration::minutes(30),
        )
        .unwrap();

        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not.a.token", SECRET).is_err());
    }

    #[test]
    fn test_tokens_carry_unique_jti() {
        let user_id = Uuid::new_v4();
        let (a, _) =
            generate_token(user_id, UserRole::User, TokenKind::Access, SECRET, Duration::minutes(5))
                .unwrap();
        let (b, _) =
            generate_token(user_id, UserRole::User, TokenKind::Access, SECRET, Duration::minutes(5))
                .unwrap();
        let claims_a = verify_token(&a, SECRET).unwrap();
        let claims_b = verify_token(&b, SECRET).unwrap();
        assert_ne!(claims_a.jti, claims_b.jti);
    }
}
