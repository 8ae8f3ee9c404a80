use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use super::{month_bounds, CheckinOrchestrator, MonthSummary};
use dailymark_domain::shared::{DomainError, UserId};
use dailymark_domain::streak::StreakStats;

impl CheckinOrchestrator {
    /// A set cache bit answers immediately; anything else is confirmed
    /// against the log, repairing the bit when the log disagrees.
    pub async fn has_checked_in_today(&self, user_id: UserId) -> Result<bool, DomainError> {
        self.ensure_user(user_id).await?;
        let today = self.clock.today();

        match self.cache.get_bit(user_id, today).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => warn!(
                user_id = user_id.value(),
                error = %e,
                "cache read skipped, answering from log"
            ),
        }

        let checked_in = self.log.exists(user_id, today).await?;
        if checked_in && self.mark_present(user_id, today).await {
            debug!(user_id = user_id.value(), %today, "read-repaired cache bit");
        }

        Ok(checked_in)
    }

    /// Checked-in days in `start..=end`, ascending.
    ///
    /// The window is backfilled from the log before the cache is scanned, so
    /// the answer does not depend on how warm the cache was.
    pub async fn calendar(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DomainError> {
        self.ensure_user(user_id).await?;

        if start > end {
            return Ok(Vec::new());
        }
        let span = (end - start).num_days() + 1;
        if span > i64::from(self.max_calendar_days) {
            return Err(DomainError::InvalidInput(format!(
                "Calendar window of {} days exceeds the limit of {}",
                span, self.max_calendar_days
            )));
        }

        let log_dates: Vec<NaiveDate> = self
            .log
            .range_query(user_id, start, end)
            .await?
            .iter()
            .map(|r| r.date())
            .collect();

        if !self.backfill(user_id, &log_dates).await {
            return Ok(log_dates);
        }

        let mut days = Vec::with_capacity(log_dates.len());
        for date in start.iter_days().take_while(|d| *d <= end) {
            match self.cache.get_bit(user_id, date).await {
                Ok(true) => days.push(date),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        user_id = user_id.value(),
                        error = %e,
                        "cache scan interrupted, answering from log"
                    );
                    return Ok(log_dates);
                }
            }
        }

        Ok(days)
    }

    pub async fn month_calendar(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<NaiveDate>, DomainError> {
        let (first, last) = month_bounds(year, month)?;
        self.calendar(user_id, first, last).await
    }

    /// Days checked in during a month, counted over the backfilled bitmap.
    pub async fn month_summary(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<MonthSummary, DomainError> {
        self.ensure_user(user_id).await?;
        let (first, last) = month_bounds(year, month)?;

        let log_dates: Vec<NaiveDate> = self
            .log
            .range_query(user_id, first, last)
            .await?
            .iter()
            .map(|r| r.date())
            .collect();
        let log_count = log_dates.len() as u64;

        let counted = if self.backfill(user_id, &log_dates).await {
            match self.cache.count_range(user_id, first, last).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(
                        user_id = user_id.value(),
                        error = %e,
                        "cache count skipped, counting from log"
                    );
                    log_count
                }
            }
        } else {
            log_count
        };

        if counted > u64::from(last.day()) {
            return Err(DomainError::DataIntegrity(format!(
                "{} check-ins counted for user {} in {}-{:02}, which has {} days",
                counted,
                user_id,
                year,
                month,
                last.day()
            )));
        }

        Ok(MonthSummary {
            year,
            month,
            total_days: last.day(),
            checked_in_days: counted as u32,
        })
    }

    /// Current streak statistics. A user with no history gets the zero state.
    pub async fn stats(&self, user_id: UserId) -> Result<StreakStats, DomainError> {
        self.tracker.snapshot(user_id).await
    }
}
