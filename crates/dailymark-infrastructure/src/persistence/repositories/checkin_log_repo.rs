use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::debug;

use crate::persistence::{map_sqlx_error, ResultExt, SqliteRepositoryBase};
use dailymark_domain::checkin::{CheckinLog, CheckinRecord, InsertOutcome};
use dailymark_domain::shared::{DomainError, UserId};

#[derive(FromRow)]
struct CheckinRow {
    user_id: i64,
    checkin_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl CheckinRow {
    fn into_record(self) -> CheckinRecord {
        CheckinRecord::restore(
            UserId::new(self.user_id),
            self.checkin_date,
            self.created_at,
        )
    }
}

const FIND_QUERY: &str = r#"
    SELECT user_id, checkin_date, created_at
    FROM checkins
    WHERE user_id = ?1 AND checkin_date = ?2
"#;

/// Insert-if-absent on an open connection or transaction.
///
/// The unique constraint on (user_id, checkin_date) decides the winner; a
/// losing writer reads the stored row back instead of failing.
pub(crate) async fn insert_if_absent(
    conn: &mut SqliteConnection,
    user_id: UserId,
    date: NaiveDate,
) -> Result<InsertOutcome, DomainError> {
    let created_at = Utc::now();

    let result = sqlx::query(
        "INSERT INTO checkins (user_id, checkin_date, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(user_id.value())
    .bind(date)
    .bind(created_at)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted(CheckinRecord::restore(
            user_id, date, created_at,
        ))),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            let duplicate = DomainError::DuplicateCheckin { user_id, date };
            debug!(
                user_id = user_id.value(),
                %date,
                "{}; reading back stored record",
                duplicate
            );

            let row: Option<CheckinRow> = sqlx::query_as(FIND_QUERY)
                .bind(user_id.value())
                .bind(date)
                .fetch_optional(&mut *conn)
                .await
                .to_store_err("Read back check-in")?;

            row.map(|r| InsertOutcome::Existing(r.into_record()))
                .ok_or_else(|| {
                    DomainError::DataIntegrity(format!("{} but no stored row found", duplicate))
                })
        }
        Err(e) => Err(map_sqlx_error(e, "Insert check-in")),
    }
}

/// Every check-in date for a user, oldest first.
pub(crate) async fn load_history(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<Vec<NaiveDate>, DomainError> {
    sqlx::query_scalar(
        "SELECT checkin_date FROM checkins WHERE user_id = ?1 ORDER BY checkin_date ASC",
    )
    .bind(user_id.value())
    .fetch_all(&mut *conn)
    .await
    .to_store_err("Load check-in history")
}

pub struct SqliteCheckinLogRepository {
    base: SqliteRepositoryBase,
}

impl SqliteCheckinLogRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl CheckinLog for SqliteCheckinLogRepository {
    async fn record_checkin(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<CheckinRecord, DomainError> {
        let mut conn = self
            .base
            .pool()
            .acquire()
            .await
            .to_store_err("Acquire connection")?;

        let outcome = insert_if_absent(&mut conn, user_id, date).await?;
        Ok(outcome.into_record())
    }

    async fn exists(&self, user_id: UserId, date: NaiveDate) -> Result<bool, DomainError> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM checkins WHERE user_id = ?1 AND checkin_date = ?2)",
        )
        .bind(user_id.value())
        .bind(date)
        .fetch_one(self.base.pool())
        .await
        .to_store_err("Check check-in exists")?;

        Ok(found != 0)
    }

    async fn find(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<CheckinRecord>, DomainError> {
        let row: Option<CheckinRow> = self
            .base
            .fetch_optional(
                sqlx::query_as(FIND_QUERY)
                    .bind(user_id.value())
                    .bind(date),
                "Find check-in",
            )
            .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn range_query(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CheckinRecord>, DomainError> {
        let query = r#"
            SELECT user_id, checkin_date, created_at
            FROM checkins
            WHERE user_id = ?1
              AND checkin_date >= ?2
              AND checkin_date <= ?3
            ORDER BY checkin_date ASC
        "#;

        let rows: Vec<CheckinRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query)
                    .bind(user_id.value())
                    .bind(start)
                    .bind(end),
                "List check-ins in range",
            )
            .await?;

        Ok(rows.into_iter().map(|r| r.into_record()).collect())
    }
}
