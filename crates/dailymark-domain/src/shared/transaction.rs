use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;

use super::{DomainError, UserId};
use crate::checkin::InsertOutcome;
use crate::streak::StreakStats;

/// Atomic scope covering a log insert and the streak update it triggers.
///
/// Everything done through one transaction becomes visible together on
/// `commit`, or not at all. Dropping without commit rolls back.
#[async_trait]
pub trait CheckinTransaction: Send {
    /// Insert-if-absent keyed by (user, date). Uniqueness is enforced by the
    /// store; a lost race yields `InsertOutcome::Existing`.
    async fn insert_checkin_if_absent(
        &mut self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<InsertOutcome, DomainError>;

    async fn load_streak(&mut self, user_id: UserId) -> Result<Option<StreakStats>, DomainError>;

    async fn save_streak(&mut self, stats: &StreakStats) -> Result<(), DomainError>;

    /// Every check-in date for the user, oldest first. Takes the store's
    /// write lock before reading, so no check-in can commit between this
    /// read and the end of the transaction.
    async fn load_history(&mut self, user_id: UserId) -> Result<Vec<NaiveDate>, DomainError>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<(), UnitOfWorkError>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<(), UnitOfWorkError>;
}

/// Error type for Unit of Work operations
#[derive(Debug)]
pub enum UnitOfWorkError {
    TransactionFailed(String),
    CommitFailed(String),
    RollbackFailed(String),
}

impl fmt::Display for UnitOfWorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransactionFailed(msg) => write!(f, "Transaction failed: {}", msg),
            Self::CommitFailed(msg) => write!(f, "Commit failed: {}", msg),
            Self::RollbackFailed(msg) => write!(f, "Rollback failed: {}", msg),
        }
    }
}

impl std::error::Error for UnitOfWorkError {}

impl From<UnitOfWorkError> for DomainError {
    fn from(err: UnitOfWorkError) -> Self {
        DomainError::StoreUnavailable(err.to_string())
    }
}

/// Unit of Work trait for managing transactional boundaries
#[async_trait]
pub trait CheckinUnitOfWork: Send + Sync {
    /// Begin a new transaction
    async fn begin(&self) -> Result<Box<dyn CheckinTransaction>, UnitOfWorkError>;
}
