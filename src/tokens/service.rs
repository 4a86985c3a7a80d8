//! Token service
//!
//! Access tokens are stateless JWTs: their signature encodes owner and
//! expiry, and nothing is persisted for them. Refresh and single-use tokens
//! are additionally stored as SHA-256 digests so they can be revoked; a
//! blacklisted row never validates again, even before its natural expiry.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::jwt::{generate_token, verify_token};
use crate::auth::AuthError;
use crate::models::{IssuedToken, TokenKind, TokenPair, TokenRecord, User, UserRole};

use super::store::TokenStore;

/// Token lifetimes, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access_minutes: i64,
    pub refresh_days: i64,
    pub reset_password_minutes: i64,
    pub verify_email_minutes: i64,
}

impl TokenTtls {
    fn for_kind(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.access_minutes),
            TokenKind::Refresh => Duration::days(self.refresh_days),
            TokenKind::ResetPassword => Duration::minutes(self.reset_password_minutes),
            TokenKind::VerifyEmail => Duration::minutes(self.verify_email_minutes),
        }
    }
}

/// Token issuance, rotation, and blacklisting.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    jwt_secret: String,
    ttls: TokenTtls,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, jwt_secret: String, ttls: TokenTtls) -> Self {
        Self {
            store,
            jwt_secret,
            ttls,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Issue an access/refresh pair for a user. The refresh token is
    /// persisted (hashed) so it can be revoked and rotated.
    pub async fn issue_auth_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self.generate(user.id, user.role, TokenKind::Access)?;
        let refresh = self.generate(user.id, user.role, TokenKind::Refresh)?;

        self.save(&refresh, user.id, TokenKind::Refresh).await?;

        Ok(TokenPair { access, refresh })
    }

    /// Rotate a refresh token: validate it, atomically blacklist it, and
    /// issue a new pair. At most one of several concurrent calls with the
    /// same token succeeds.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(Uuid, TokenPair), AuthError> {
        let claims = verify_token(refresh_token, &self.jwt_secret)
            .map_err(|_| AuthError::InvalidToken)?;
        claims
            .require_kind(TokenKind::Refresh)
            .map_err(|_| AuthError::InvalidToken)?;

        let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;
        let role = UserRole::parse(&claims.role).ok_or(AuthError::InvalidToken)?;

        let record = self
            .find(refresh_token, TokenKind::Refresh)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if record.blacklisted {
            return Err(AuthError::InvalidToken);
        }

        // Losing this compare-and-set means another request already rotated
        if !self.store.blacklist(record.id).await? {
            return Err(AuthError::InvalidToken);
        }

        let access = self.generate(user_id, role, TokenKind::Access)?;
        let refresh = self.generate(user_id, role, TokenKind::Refresh)?;
        self.save(&refresh, user_id, TokenKind::Refresh).await?;

        Ok((user_id, TokenPair { access, refresh }))
    }

    /// Blacklist a refresh token (logout). An unknown, expired, or already
    /// blacklisted token fails with `InvalidToken`.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        verify_token(refresh_token, &self.jwt_secret).map_err(|_| AuthError::InvalidToken)?;

        let record = self
            .find(refresh_token, TokenKind::Refresh)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if record.blacklisted || !self.store.blacklist(record.id).await? {
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }

    /// Issue a single-use token (reset-password or verify-email).
    pub async fn issue_single_use(
        &self,
        kind: TokenKind,
        user: &User,
    ) -> Result<IssuedToken, AuthError> {
        debug_assert!(matches!(
            kind,
            TokenKind::ResetPassword | TokenKind::VerifyEmail
        ));

        let token = self.generate(user.id, user.role, kind)?;
        self.save(&token, user.id, kind).await?;
        Ok(token)
    }

    /// Consume a single-use token, blacklisting it in the same step.
    ///
    /// Fails `TokenExpired` past its expiry, `AlreadyUsed` on a second
    /// consumption, and `InvalidToken` for everything else.
    pub async fn consume_single_use(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<Uuid, AuthError> {
        let claims = verify_token(token, &self.jwt_secret)?;
        claims.require_kind(kind).map_err(|_| AuthError::InvalidToken)?;
        let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;

        let record = self.find(token, kind).await?.ok_or(AuthError::InvalidToken)?;
        if record.blacklisted {
            return Err(AuthError::AlreadyUsed);
        }
        if !self.store.blacklist(record.id).await? {
            return Err(AuthError::AlreadyUsed);
        }

        Ok(user_id)
    }

    /// Blacklist every live token of a kind for a user. Returns the number
    /// of tokens revoked.
    pub async fn revoke_all(&self, user_id: Uuid, kind: TokenKind) -> Result<u64, AuthError> {
        self.store.blacklist_all(user_id, kind).await
    }

    fn generate(
        &self,
        user_id: Uuid,
        role: UserRole,
        kind: TokenKind,
    ) -> Result<IssuedToken, AuthError> {
        let (token, expires_at) = generate_token(
            user_id,
            role,
            kind,
            &self.jwt_secret,
            self.ttls.for_kind(kind),
        )?;
        Ok(IssuedToken { token, expires_at })
    }

    async fn save(
        &self,
        token: &IssuedToken,
        user_id: Uuid,
        kind: TokenKind,
    ) -> Result<(), AuthError> {
        let record = TokenRecord {
            id: Uuid::new_v4(),
            token_hash: hash_token(&token.token),
            user_id,
            kind,
            expires_at: token.expires_at,
            blacklisted: false,
            created_at: Utc::now(),
        };
        self.store.insert(&record).await
    }

    async fn find(&self, token: &str, kind: TokenKind) -> Result<Option<TokenRecord>, AuthError> {
        self.store.find_by_hash(&hash_token(token), kind).await
    }
}

/// Digest a token for storage; raw token values never touch the database.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
