use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dailymark_domain::checkin::CheckinRecord;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckinRecordDto {
    pub user_id: i64,
    pub date: NaiveDate, // YYYY-MM-DD
    pub created_at: DateTime<Utc>,
}

impl From<CheckinRecord> for CheckinRecordDto {
    fn from(record: CheckinRecord) -> Self {
        Self {
            user_id: record.user_id().value(),
            date: record.date(),
            created_at: record.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckinStatusDto {
    pub user_id: i64,
    pub date: NaiveDate,
    pub checked_in: bool,
}

/// Checked-in days within an inclusive window, ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDto {
    pub user_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub checked_in_days: usize,
}

impl CalendarDto {
    pub fn new(user_id: i64, start: NaiveDate, end: NaiveDate, days: Vec<NaiveDate>) -> Self {
        Self {
            user_id,
            start,
            end,
            checked_in_days: days.len(),
            days,
        }
    }
}
