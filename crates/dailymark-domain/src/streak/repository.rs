use async_trait::async_trait;

use super::StreakStats;
use crate::shared::{DomainError, UserId};

/// Read access to persisted streak statistics. Writes go through a
/// `CheckinTransaction` so they stay coupled to the log insert.
#[async_trait]
pub trait StreakRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<StreakStats>, DomainError>;
}
