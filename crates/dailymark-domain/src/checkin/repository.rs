use async_trait::async_trait;
use chrono::NaiveDate;

use super::CheckinRecord;
use crate::shared::{DomainError, UserId};

/// Durable, authoritative record of check-ins.
///
/// Implementations enforce uniqueness of (user, date) at the storage layer.
#[async_trait]
pub trait CheckinLog: Send + Sync {
    /// Insert the check-in if absent, otherwise return the stored record.
    ///
    /// A concurrent insert race is resolved internally by reading back the
    /// winning record and is never surfaced as an error.
    async fn record_checkin(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<CheckinRecord, DomainError>;

    async fn exists(&self, user_id: UserId, date: NaiveDate) -> Result<bool, DomainError>;

    async fn find(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<CheckinRecord>, DomainError>;

    /// Records with `start <= date <= end`, ascending by date.
    async fn range_query(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CheckinRecord>, DomainError>;
}
