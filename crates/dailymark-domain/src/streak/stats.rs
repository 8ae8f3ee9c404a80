use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, UserId};

/// How a check-in changed the running streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// The day after the previous check-in: streak grew by one.
    Extended,
    /// First check-in or a gap: streak restarted at one.
    Restarted,
    /// Same day as the previous check-in: nothing changed.
    Unchanged,
}

/// Running streak statistics for one user.
///
/// Invariants: `longest_streak >= current_streak`, and `current_streak == 0`
/// exactly when `last_checkin_date` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    user_id: UserId,
    last_checkin_date: Option<NaiveDate>,
    current_streak: u32,
    longest_streak: u32,
}

impl StreakStats {
    /// Zero state for a user without history.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            last_checkin_date: None,
            current_streak: 0,
            longest_streak: 0,
        }
    }

    pub fn restore(
        user_id: UserId,
        last_checkin_date: Option<NaiveDate>,
        current_streak: u32,
        longest_streak: u32,
    ) -> Result<Self, DomainError> {
        if longest_streak < current_streak {
            return Err(DomainError::DataIntegrity(format!(
                "longest streak {} below current streak {} for user {}",
                longest_streak, current_streak, user_id
            )));
        }
        if (current_streak == 0) != last_checkin_date.is_none() {
            return Err(DomainError::DataIntegrity(format!(
                "current streak {} inconsistent with last check-in {:?} for user {}",
                current_streak, last_checkin_date, user_id
            )));
        }

        Ok(Self {
            user_id,
            last_checkin_date,
            current_streak,
            longest_streak,
        })
    }

    /// Rebuild statistics from a user's full check-in history.
    pub fn replay<I>(user_id: UserId, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_unstable();
        dates.dedup();

        let mut stats = Self::new(user_id);
        for date in dates {
            stats.record_checkin(date);
        }
        stats
    }

    /// Apply a check-in for `date`.
    pub fn record_checkin(&mut self, date: NaiveDate) -> StreakTransition {
        let transition = match self.last_checkin_date {
            Some(last) if date.pred_opt() == Some(last) => {
                self.current_streak = self.current_streak.saturating_add(1);
                StreakTransition::Extended
            }
            Some(last) if last == date => return StreakTransition::Unchanged,
            _ => {
                self.current_streak = 1;
                StreakTransition::Restarted
            }
        };

        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_checkin_date = Some(date);
        transition
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn last_checkin_date(&self) -> Option<NaiveDate> {
        self.last_checkin_date
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }
}
