use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Sqlite, Transaction as SqlxTransaction};
use std::sync::Arc;

use super::repositories::{checkin_log_repo, streak_repo};
use dailymark_domain::checkin::InsertOutcome;
use dailymark_domain::shared::{
    CheckinTransaction, CheckinUnitOfWork, DomainError, UnitOfWorkError, UserId,
};
use dailymark_domain::streak::StreakStats;

/// Sqlite implementation of CheckinTransaction
///
/// The first statement of every transaction is a write (the log insert, or
/// claiming the stats row before a history read), so the transaction takes
/// SQLite's write lock before it reads anything. Concurrent check-ins and
/// recalculations are therefore serialized by the store.
pub struct SqliteCheckinTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl SqliteCheckinTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl CheckinTransaction for SqliteCheckinTransaction {
    async fn insert_checkin_if_absent(
        &mut self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<InsertOutcome, DomainError> {
        checkin_log_repo::insert_if_absent(&mut self.tx, user_id, date).await
    }

    async fn load_streak(&mut self, user_id: UserId) -> Result<Option<StreakStats>, DomainError> {
        streak_repo::load_streak(&mut self.tx, user_id).await
    }

    async fn save_streak(&mut self, stats: &StreakStats) -> Result<(), DomainError> {
        streak_repo::save_streak(&mut self.tx, stats).await
    }

    async fn load_history(&mut self, user_id: UserId) -> Result<Vec<NaiveDate>, DomainError> {
        streak_repo::claim_streak_row(&mut self.tx, user_id).await?;
        checkin_log_repo::load_history(&mut self.tx, user_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), UnitOfWorkError> {
        self.tx
            .commit()
            .await
            .map_err(|e| UnitOfWorkError::CommitFailed(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), UnitOfWorkError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| UnitOfWorkError::RollbackFailed(e.to_string()))
    }
}

/// Sqlite implementation of Unit of Work
pub struct SqliteUnitOfWork {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteUnitOfWork {
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckinUnitOfWork for SqliteUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn CheckinTransaction>, UnitOfWorkError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| UnitOfWorkError::TransactionFailed(e.to_string()))?;

        Ok(Box::new(SqliteCheckinTransaction::new(tx)))
    }
}
