use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use super::{StreakRepository, StreakStats, StreakTransition};
use crate::shared::{CheckinTransaction, DomainError, UserId};

/// Maintains per-user streak statistics alongside log inserts.
pub struct StreakTracker {
    repository: Arc<dyn StreakRepository>,
}

impl StreakTracker {
    pub fn new(repository: Arc<dyn StreakRepository>) -> Self {
        Self { repository }
    }

    /// Update the user's streak for a check-in on `date` inside `tx`.
    ///
    /// Must run in the same transaction that inserted the log record so two
    /// racing check-ins cannot both increment.
    pub async fn on_checkin(
        &self,
        tx: &mut dyn CheckinTransaction,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<StreakStats, DomainError> {
        let mut stats = tx
            .load_streak(user_id)
            .await?
            .unwrap_or_else(|| StreakStats::new(user_id));

        let transition = stats.record_checkin(date);
        if transition != StreakTransition::Unchanged {
            tx.save_streak(&stats).await?;
        }

        debug!(
            user_id = user_id.value(),
            %date,
            ?transition,
            current = stats.current_streak(),
            longest = stats.longest_streak(),
            "streak updated"
        );

        Ok(stats)
    }

    /// Current statistics, or the zero state for a user with no history.
    pub async fn snapshot(&self, user_id: UserId) -> Result<StreakStats, DomainError> {
        Ok(self
            .repository
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| StreakStats::new(user_id)))
    }
}
