use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::trace;

use super::BitStore;
use crate::shared::{DomainError, UserId};

/// Per-user, per-year presence bitmap over a `BitStore`.
///
/// A set bit means the day is known to be checked in; an unset bit means
/// "unknown or absent". The cache starts empty and learns history only
/// through `set_bit`, so callers must confirm negative answers against the
/// log.
pub struct CheckinBitmapCache {
    store: Arc<dyn BitStore>,
}

impl CheckinBitmapCache {
    pub fn new(store: Arc<dyn BitStore>) -> Self {
        Self { store }
    }

    pub fn key(user_id: UserId, year: i32) -> String {
        format!("checkin:{}:{}", user_id, year)
    }

    /// Zero-based day of year.
    pub fn offset(date: NaiveDate) -> u32 {
        date.ordinal0()
    }

    /// Mark `date` present. Returns the previous bit.
    pub async fn set_bit(&self, user_id: UserId, date: NaiveDate) -> Result<bool, DomainError> {
        let key = Self::key(user_id, date.year());
        let previous = self.store.set_bit(&key, Self::offset(date), true).await?;
        trace!(%key, %date, previous, "bitmap bit set");
        Ok(previous)
    }

    pub async fn get_bit(&self, user_id: UserId, date: NaiveDate) -> Result<bool, DomainError> {
        let key = Self::key(user_id, date.year());
        self.store.get_bit(&key, Self::offset(date)).await
    }

    /// Set bits across `start..=end`, which may span several years.
    pub async fn count_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, DomainError> {
        if start > end {
            return Ok(0);
        }

        let mut total = 0u64;
        for year in start.year()..=end.year() {
            let segment_start = if year == start.year() {
                start
            } else {
                first_day_of_year(year)?
            };
            let segment_end = if year == end.year() {
                end
            } else {
                last_day_of_year(year)?
            };

            let count = self
                .store
                .count_bits(
                    &Self::key(user_id, year),
                    Self::offset(segment_start),
                    Self::offset(segment_end),
                )
                .await?;
            total += u64::from(count);
        }

        Ok(total)
    }
}

fn first_day_of_year(year: i32) -> Result<NaiveDate, DomainError> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| DomainError::InvalidInput(format!("Year out of range: {}", year)))
}

fn last_day_of_year(year: i32) -> Result<NaiveDate, DomainError> {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| DomainError::InvalidInput(format!("Year out of range: {}", year)))
}
