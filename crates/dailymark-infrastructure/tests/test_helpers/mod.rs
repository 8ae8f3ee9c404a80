#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::path::Path;

use dailymark_infrastructure::config::TimeoutConfig;
use dailymark_infrastructure::persistence::Database;

/// Migrated private in-memory database.
pub async fn setup_in_memory_db() -> SqlitePool {
    let db = Database::in_memory().await.expect("open in-memory db");
    db.run_migrations().await.expect("run migrations");
    db.pool().clone()
}

/// Migrated file-backed database with a real connection pool, for tests
/// that need several writers at once.
pub async fn setup_file_db(dir: &Path) -> SqlitePool {
    let path = dir.join("dailymark-test.db");
    let db = Database::new(path.to_str().expect("utf-8 path"), &TimeoutConfig::default())
        .await
        .expect("open file db");
    db.run_migrations().await.expect("run migrations");
    db.pool().clone()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
