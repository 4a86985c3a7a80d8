//! User directory service

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::nonce::{rotated_nonce, NonceSource};
use crate::auth::AuthError;
use crate::models::{User, UserRole};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, address, nonce, role, is_email_verified, created_at, updated_at";

/// Fields for explicit (email/password) registration.
#[derive(Debug)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// Identity directory backed by the `users` table.
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    nonces: Arc<dyn NonceSource>,
}

impl UserService {
    pub fn new(pool: PgPool, nonces: Arc<dyn NonceSource>) -> Self {
        Self { pool, nonces }
    }

    /// Get a user by ID, failing with `NotFound` if absent.
    pub async fn get_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up by lowercase-normalized address.
    pub async fn find_by_address(&self, address: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE address = $1"))
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create an email/password user. A taken email or username surfaces as
    /// `Conflict` via the unique-violation mapping.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let user = sqlx::query_as(&format!(
            "INSERT INTO users (id, username, email, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(UserRole::User)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Fetch the identity bound to `address`, creating it with a fresh nonce
    /// on first contact. Idempotent: an insert losing the unique-index race
    /// falls back to the concurrently created row.
    pub async fn find_or_create_by_address(&self, address: &str) -> Result<User, AuthError> {
        if let Some(user) = self.find_by_address(address).await? {
            return Ok(user);
        }

        let inserted: Option<User> = sqlx::query_as(&format!(
            "INSERT INTO users (id, address, nonce, role)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (address) DO NOTHING
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(address)
        .bind(self.nonces.next_nonce())
        .bind(UserRole::User)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = inserted {
            tracing::info!(address = %address, user_id = %user.id, "provisioned identity for new address");
            return Ok(user);
        }

        // Lost the race; the other request's row is authoritative
        self.find_by_address(address).await?.ok_or(AuthError::NotFound)
    }

    /// Rotate the sign-in nonce with a compare-and-set on its current value.
    ///
    /// Exactly one of two concurrent verifications holding the same nonce can
    /// succeed here; the loser observes zero updated rows.
    pub async fn rotate_nonce(&self, user: &User) -> Result<User, AuthError> {
        let current = user.nonce.ok_or_else(|| {
            AuthError::Internal("wallet user is missing a nonce".to_string())
        })?;
        let next = rotated_nonce(self.nonces.as_ref(), current);

        let updated: Option<User> = sqlx::query_as(&format!(
            "UPDATE users SET nonce = $1, updated_at = NOW()
             WHERE id = $2 AND nonce = $3
             RETURNING {USER_COLUMNS}"
        ))
        .bind(next)
        .bind(user.id)
        .bind(current)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(AuthError::SignatureMismatch)
    }

    pub async fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AuthError> {
        let rows = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub async fn mark_email_verified(&self, user_id: Uuid) -> Result<(), AuthError> {
        let rows = sqlx::query(
            "UPDATE users SET is_email_verified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }
}
