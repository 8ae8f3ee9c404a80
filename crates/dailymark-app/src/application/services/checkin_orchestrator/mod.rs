//! Check-in orchestration.
//!
//! Composes the durable log, the presence bitmap and the streak tracker into
//! the operations callers use. The log is authoritative: writes go to it
//! first (together with the streak update, in one transaction) and the cache
//! is updated afterwards on a best-effort basis. Reads prefer the cache,
//! re-verify every negative answer against the log and repair the cache on
//! the way out.

mod read;
mod record;

#[cfg(test)]
mod tests;

use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::{trace, warn};

use dailymark_domain::bitmap::{BitStore, CheckinBitmapCache};
use dailymark_domain::checkin::CheckinLog;
use dailymark_domain::shared::{CheckinUnitOfWork, Clock, DomainError, UserId};
use dailymark_domain::streak::{StreakRepository, StreakTracker};
use dailymark_domain::user::UserDirectory;

pub const DEFAULT_MAX_CALENDAR_DAYS: u32 = 3660;

/// Check-in totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub total_days: u32,
    pub checked_in_days: u32,
}

impl MonthSummary {
    /// Percentage of days checked in, 0.0 - 100.0
    pub fn check_in_rate(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        f64::from(self.checked_in_days) * 100.0 / f64::from(self.total_days)
    }
}

pub struct CheckinOrchestrator {
    log: Arc<dyn CheckinLog>,
    unit_of_work: Arc<dyn CheckinUnitOfWork>,
    cache: CheckinBitmapCache,
    tracker: StreakTracker,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    max_calendar_days: u32,
}

impl CheckinOrchestrator {
    pub fn new(
        log: Arc<dyn CheckinLog>,
        unit_of_work: Arc<dyn CheckinUnitOfWork>,
        bit_store: Arc<dyn BitStore>,
        streaks: Arc<dyn StreakRepository>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log,
            unit_of_work,
            cache: CheckinBitmapCache::new(bit_store),
            tracker: StreakTracker::new(streaks),
            users,
            clock,
            max_calendar_days: DEFAULT_MAX_CALENDAR_DAYS,
        }
    }

    pub fn with_max_calendar_days(mut self, max_calendar_days: u32) -> Self {
        self.max_calendar_days = max_calendar_days;
        self
    }

    /// "Today" according to the configured clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    async fn ensure_user(&self, user_id: UserId) -> Result<(), DomainError> {
        if self.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(DomainError::UserNotFound(user_id))
        }
    }

    /// Best-effort `set_bit`. Failures are logged and swallowed since the
    /// log already holds the record and later reads repair the bit.
    async fn mark_present(&self, user_id: UserId, date: NaiveDate) -> bool {
        match self.cache.set_bit(user_id, date).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    user_id = user_id.value(),
                    %date,
                    error = %e,
                    "cache update skipped, continuing log-only"
                );
                false
            }
        }
    }

    /// Copy log dates into the cache. Stops at the first failure and reports
    /// whether the cache can be trusted for a subsequent scan.
    async fn backfill(&self, user_id: UserId, dates: &[NaiveDate]) -> bool {
        for &date in dates {
            if !self.mark_present(user_id, date).await {
                return false;
            }
        }
        trace!(user_id = user_id.value(), days = dates.len(), "cache backfilled");
        true
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), DomainError> {
    if !(1..=12).contains(&month) {
        return Err(DomainError::InvalidInput(format!(
            "Invalid month {}: expected 1-12",
            month
        )));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::InvalidInput(format!("Invalid year {}", year)))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| DomainError::InvalidInput(format!("Invalid year {}", year)))?;

    debug_assert_eq!(last.month(), month);
    Ok((first, last))
}
