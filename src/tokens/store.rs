//! Token persistence
//!
//! The row store sits behind a trait so the rotation/blacklist state machine
//! can be driven without a database, the same way `NonceSource` injects
//! randomness. The production impl is Postgres-backed; the compare-and-set
//! semantics live in the SQL.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::{TokenKind, TokenRecord};

/// Storage for persisted (refresh and single-use) token rows.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, record: &TokenRecord) -> Result<(), AuthError>;

    async fn find_by_hash(
        &self,
        token_hash: &str,
        kind: TokenKind,
    ) -> Result<Option<TokenRecord>, AuthError>;

    /// Compare-and-set blacklist; `false` means the row was absent or
    /// already blacklisted.
    async fn blacklist(&self, id: Uuid) -> Result<bool, AuthError>;

    /// Blacklist every live token of a kind for a user, returning the count.
    async fn blacklist_all(&self, user_id: Uuid, kind: TokenKind) -> Result<u64, AuthError>;
}

/// Postgres-backed token store.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, record: &TokenRecord) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO tokens (id, token_hash, user_id, kind, expires_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(&record.token_hash)
        .bind(record.user_id)
        .bind(record.kind)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
        kind: TokenKind,
    ) -> Result<Option<TokenRecord>, AuthError> {
        let record = sqlx::query_as(
            "SELECT id, token_hash, user_id, kind, expires_at, blacklisted, created_at
             FROM tokens
             WHERE token_hash = $1 AND kind = $2",
        )
        .bind(token_hash)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn blacklist(&self, id: Uuid) -> Result<bool, AuthError> {
        let rows = sqlx::query(
            "UPDATE tokens SET blacklisted = TRUE WHERE id = $1 AND blacklisted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }

    async fn blacklist_all(&self, user_id: Uuid, kind: TokenKind) -> Result<u64, AuthError> {
        let rows = sqlx::query(
            "UPDATE tokens SET blacklisted = TRUE
             WHERE user_id = $1 AND kind = $2 AND blacklisted = FALSE",
        )
        .bind(user_id)
        .bind(kind)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::auth::AuthError;
    use crate::models::{TokenKind, TokenRecord};

    use super::TokenStore;

    /// In-memory store with the same compare-and-set semantics as the
    /// Postgres one.
    #[derive(Default)]
    pub struct MemoryTokenStore {
        records: Mutex<HashMap<Uuid, TokenRecord>>,
    }

    #[async_trait]
    impl TokenStore for MemoryTokenStore {
        async fn insert(&self, record: &TokenRecord) -> Result<(), AuthError> {
            self.records
                .lock()
                .unwrap()
                .insert(record.id, record.clone());
            Ok(())
        }

        async fn find_by_hash(
            &self,
            token_hash: &str,
            kind: TokenKind,
        ) -> Result<Option<TokenRecord>, AuthError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .find(|r| r.token_hash == token_hash && r.kind == kind)
                .cloned())
        }

        async fn blacklist(&self, id: Uuid) -> Result<bool, AuthError> {
            let mut records = self.records.lock().unwrap();
            match records.get_mut(&id) {
                Some(record) if !record.blacklisted => {
                    record.blacklisted = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn blacklist_all(&self, user_id: Uuid, kind: TokenKind) -> Result<u64, AuthError> {
            let mut count = 0;
            for record in self.records.lock().unwrap().values_mut() {
                if record.user_id == user_id && record.kind == kind && !record.blacklisted {
                    record.blacklisted = true;
                    count += 1;
                }
            }
            Ok(count)
        }
    }
}
