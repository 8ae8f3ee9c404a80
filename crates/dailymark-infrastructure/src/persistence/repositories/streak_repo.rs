use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::sync::Arc;

use crate::persistence::{ResultExt, SqliteRepositoryBase};
use dailymark_domain::shared::{DomainError, UserId};
use dailymark_domain::streak::{StreakRepository, StreakStats};

#[derive(FromRow)]
struct StreakRow {
    user_id: i64,
    last_checkin_date: Option<NaiveDate>,
    current_streak: i64,
    longest_streak: i64,
}

impl StreakRow {
    fn try_into_stats(self) -> Result<StreakStats, DomainError> {
        let user_id = UserId::new(self.user_id);
        let current = u32::try_from(self.current_streak).map_err(|_| {
            DomainError::DataIntegrity(format!(
                "Invalid current_streak {} for user {}",
                self.current_streak, user_id
            ))
        })?;
        let longest = u32::try_from(self.longest_streak).map_err(|_| {
            DomainError::DataIntegrity(format!(
                "Invalid longest_streak {} for user {}",
                self.longest_streak, user_id
            ))
        })?;

        StreakStats::restore(user_id, self.last_checkin_date, current, longest)
    }
}

const FIND_QUERY: &str = r#"
    SELECT user_id, last_checkin_date, current_streak, longest_streak
    FROM user_checkin_stats
    WHERE user_id = ?1
"#;

pub(crate) async fn load_streak(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<Option<StreakStats>, DomainError> {
    let row: Option<StreakRow> = sqlx::query_as(FIND_QUERY)
        .bind(user_id.value())
        .fetch_optional(&mut *conn)
        .await
        .to_store_err("Load streak stats")?;

    row.map(|r| r.try_into_stats()).transpose()
}

/// Make sure the user's stats row exists without changing it.
///
/// This is a write, so running it first in a deferred transaction takes
/// SQLite's write lock before anything is read.
pub(crate) async fn claim_streak_row(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO user_checkin_stats (user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(user_id.value())
    .execute(&mut *conn)
    .await
    .to_store_err("Claim streak stats row")?;

    Ok(())
}

pub(crate) async fn save_streak(
    conn: &mut SqliteConnection,
    stats: &StreakStats,
) -> Result<(), DomainError> {
    let query = r#"
        INSERT INTO user_checkin_stats (
            user_id,
            last_checkin_date,
            current_streak,
            longest_streak,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id) DO UPDATE SET
            last_checkin_date = ?2,
            current_streak = ?3,
            longest_streak = ?4,
            updated_at = ?5
    "#;

    sqlx::query(query)
        .bind(stats.user_id().value())
        .bind(stats.last_checkin_date())
        .bind(i64::from(stats.current_streak()))
        .bind(i64::from(stats.longest_streak()))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .to_store_err("Save streak stats")?;

    Ok(())
}

pub struct SqliteStreakRepository {
    base: SqliteRepositoryBase,
}

impl SqliteStreakRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl StreakRepository for SqliteStreakRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<StreakStats>, DomainError> {
        let row: Option<StreakRow> = self
            .base
            .fetch_optional(
                sqlx::query_as(FIND_QUERY).bind(user_id.value()),
                "Find streak stats",
            )
            .await?;

        row.map(|r| r.try_into_stats()).transpose()
    }
}
