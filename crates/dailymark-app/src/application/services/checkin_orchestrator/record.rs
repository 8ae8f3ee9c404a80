use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::CheckinOrchestrator;
use dailymark_domain::checkin::{CheckinRecord, InsertOutcome};
use dailymark_domain::shared::{CheckinTransaction, DomainError, UserId};
use dailymark_domain::streak::StreakStats;

impl CheckinOrchestrator {
    /// Record a check-in for today. Idempotent: repeated calls on the same
    /// day return the stored record without touching the streak.
    pub async fn checkin_today(&self, user_id: UserId) -> Result<CheckinRecord, DomainError> {
        self.ensure_user(user_id).await?;
        let today = self.clock.today();

        if let Some(existing) = self.log.find(user_id, today).await? {
            debug!(user_id = user_id.value(), %today, "already checked in");
            return Ok(existing);
        }

        let outcome = self.insert_with_streak(user_id, today).await?;
        if outcome.is_inserted() {
            info!(user_id = user_id.value(), %today, "check-in recorded");
        } else {
            debug!(
                user_id = user_id.value(),
                %today,
                "lost check-in race, returning stored record"
            );
        }

        // After commit, so a rolled-back record never leaves a set bit.
        self.mark_present(user_id, today).await;

        Ok(outcome.into_record())
    }

    /// Insert-if-absent and, only when this call inserted, advance the
    /// streak. Both happen in one transaction.
    async fn insert_with_streak(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<InsertOutcome, DomainError> {
        let mut tx = self.unit_of_work.begin().await?;

        let result = async {
            let outcome = tx.insert_checkin_if_absent(user_id, date).await?;
            if outcome.is_inserted() {
                self.tracker.on_checkin(tx.as_mut(), user_id, date).await?;
            }
            Ok::<_, DomainError>(outcome)
        }
        .await;

        match result {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(e) => {
                rollback_quietly(tx).await;
                Err(e)
            }
        }
    }

    /// Rebuild a user's streak statistics from the full log history and
    /// overwrite the stored value. The history read and the overwrite share
    /// one transaction that holds the write lock, so a concurrent check-in
    /// lands either before the read or after the commit.
    pub async fn recalculate_stats(&self, user_id: UserId) -> Result<StreakStats, DomainError> {
        self.ensure_user(user_id).await?;

        let mut tx = self.unit_of_work.begin().await?;

        let result = async {
            let history = tx.load_history(user_id).await?;
            let replayed = StreakStats::replay(user_id, history.iter().copied());
            tx.save_streak(&replayed).await?;
            Ok::<_, DomainError>((history.len(), replayed))
        }
        .await;

        let (days, replayed) = match result {
            Ok(rebuilt) => rebuilt,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e);
            }
        };
        tx.commit().await?;

        info!(
            user_id = user_id.value(),
            days,
            current = replayed.current_streak(),
            longest = replayed.longest_streak(),
            "streak recalculated"
        );

        Ok(replayed)
    }
}

async fn rollback_quietly(tx: Box<dyn CheckinTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}
