use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::persistence::{ResultExt, SqliteRepositoryBase};
use dailymark_domain::shared::{DomainError, UserId};
use dailymark_domain::user::UserDirectory;

/// Reads the `users` table maintained by the identity subsystem.
pub struct SqliteUserDirectory {
    base: SqliteRepositoryBase,
}

impl SqliteUserDirectory {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }

    /// Register a user id. Identity management lives elsewhere; this exists
    /// for provisioning scripts and tests.
    pub async fn register(&self, user_id: UserId) -> Result<(), DomainError> {
        self.base
            .execute(
                sqlx::query("INSERT OR IGNORE INTO users (id) VALUES (?1)").bind(user_id.value()),
                "Register user",
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn exists(&self, user_id: UserId) -> Result<bool, DomainError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
            .bind(user_id.value())
            .fetch_one(self.base.pool())
            .await
            .to_store_err("Check user exists")?;

        Ok(found != 0)
    }
}
