//! Authentication service
//!
//! Orchestrates both sign-in flows and the token lifecycle on top of the
//! user directory and token service.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChallengeResponse, TokenKind, TokenPair, User};
use crate::services::EmailService;
use crate::tokens::TokenService;
use crate::users::{NewUser, UserService};

use super::address::{normalize_address, AddressError};
use super::challenge::build_challenge;
use super::crypto::{verify_personal_signature, CryptoError};
use super::jwt::JwtError;
use super::password::{hash_password, verify_password, PasswordError};

/// Authentication errors, mapped onto HTTP statuses in `crate::error`.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no matching identity or token")]
    NotFound,

    #[error("identity already exists")]
    Conflict,

    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("signature verification failed")]
    SignatureMismatch,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("token already used")]
    AlreadyUsed,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AuthError::Conflict;
            }
        }
        AuthError::Database(e.to_string())
    }
}

impl From<AddressError> for AuthError {
    fn from(e: AddressError) -> Self {
        AuthError::Validation(e.to_string())
    }
}

impl From<CryptoError> for AuthError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::SignerMismatch { .. } | CryptoError::RecoveryFailed(_) => {
                AuthError::SignatureMismatch
            }
            other => AuthError::Validation(other.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    tokens: TokenService,
    mailer: EmailService,
}

impl AuthService {
    pub fn new(users: UserService, tokens: TokenService, mailer: EmailService) -> Self {
        Self {
            users,
            tokens,
            mailer,
        }
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn jwt_secret(&self) -> &str {
        self.tokens.jwt_secret()
    }

    /// Issue a sign-in challenge for a wallet address, provisioning the
    /// identity on first contact.
    pub async fn generate_challenge(&self, address: &str) -> Result<ChallengeResponse, AuthError> {
        let address = normalize_address(address)?;
        let user = self.users.find_or_create_by_address(&address).await?;
        let nonce = user
            .nonce
            .ok_or_else(|| AuthError::Internal("wallet user is missing a nonce".to_string()))?;

        Ok(ChallengeResponse {
            message: build_challenge(&address, nonce),
            address,
            nonce,
        })
    }

    /// Verify a signed challenge and mint a session.
    ///
    /// The nonce rotates only on success, so a failed attempt leaves the
    /// legitimate holder's challenge intact; the compare-and-set in
    /// `rotate_nonce` guarantees a given nonce value verifies at most once.
    pub async fn verify_signature(
        &self,
        address: &str,
        signature: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let address = normalize_address(address)?;
        let user = self
            .users
            .find_by_address(&address)
            .await?
            .ok_or(AuthError::NotFound)?;
        let nonce = user
            .nonce
            .ok_or_else(|| AuthError::Internal("wallet user is missing a nonce".to_string()))?;

        let message = build_challenge(&address, nonce);
        verify_personal_signature(&address, &message, signature)?;

        let user = self.users.rotate_nonce(&user).await?;
        tracing::info!(user_id = %user.id, "wallet sign-in verified, nonce rotated");

        let tokens = self.tokens.issue_auth_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Register a new email/password identity and mint a session.
    pub async fn register(
        &self,
        username: Option<String>,
        email: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create_user(NewUser {
                username,
                email: email.to_lowercase(),
                password_hash,
            })
            .await?;
        tracing::info!(user_id = %user.id, "registered new user");

        let tokens = self.tokens.issue_auth_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Email/password login. Both an unknown email and a wrong password
    /// surface as the same `InvalidCredentials`; neither mutates state.
    pub async fn login_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let user = self
            .users
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = user
            .password_hash
            .as_deref()
            .map(|hash| verify_password(password, hash))
            .unwrap_or(false);
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_auth_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Rotate a refresh token into a new pair.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<(User, TokenPair), AuthError> {
        let (user_id, tokens) = self.tokens.refresh(refresh_token).await?;
        let user = self.users.get_by_id(user_id).await?;
        Ok((user, tokens))
    }

    /// Blacklist a refresh token.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.tokens.revoke(refresh_token).await
    }

    /// Issue a reset-password token and hand it to the mailer. An unknown
    /// email is not revealed to the caller.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = email.to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = self
            .tokens
            .issue_single_use(TokenKind::ResetPassword, &user)
            .await?;
        self.mailer.send_reset_password_email(&email, &token.token);
        Ok(())
    }

    /// Consume a reset token, set the new password, and revoke every
    /// outstanding refresh token for the account.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let user_id = self
            .tokens
            .consume_single_use(token, TokenKind::ResetPassword)
            .await?;

        let password_hash = hash_password(new_password)?;
        self.users.set_password(user_id, &password_hash).await?;

        let revoked = self.tokens.revoke_all(user_id, TokenKind::Refresh).await?;
        tracing::info!(user_id = %user_id, revoked, "password reset, refresh tokens revoked");
        Ok(())
    }

    /// Issue a verify-email token for an authenticated user.
    pub async fn send_verification_email(&self, user_id: Uuid) -> Result<(), AuthError> {
        let user = self.users.get_by_id(user_id).await?;
        let email = user.email.clone().ok_or_else(|| {
            AuthError::Validation("account has no email address".to_string())
        })?;

        let token = self
            .tokens
            .issue_single_use(TokenKind::VerifyEmail, &user)
            .await?;
        self.mailer.send_verification_email(&email, &token.token);
        Ok(())
    }

    /// Consume a verify-email token and mark the account verified.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let user_id = self
            .tokens
            .consume_single_use(token, TokenKind::VerifyEmail)
            .await?;

        self.users.mark_email_verified(user_id).await?;
        self.tokens.revoke_all(user_id, TokenKind::VerifyEmail).await?;
        tracing::info!(user_id = %user_id, "email verified");
        Ok(())
    }
}
