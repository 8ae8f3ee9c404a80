use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::UserId;

/// A user's check-in for exactly one calendar day.
///
/// Records are immutable: the log creates one per (user, date) and never
/// updates or removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinRecord {
    user_id: UserId,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl CheckinRecord {
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            created_at: Utc::now(),
        }
    }

    pub fn restore(user_id: UserId, date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            date,
            created_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Result of an insert-if-absent against the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call created the record.
    Inserted(CheckinRecord),
    /// A record already existed (possibly written by a concurrent caller).
    Existing(CheckinRecord),
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }

    pub fn record(&self) -> &CheckinRecord {
        match self {
            InsertOutcome::Inserted(record) | InsertOutcome::Existing(record) => record,
        }
    }

    pub fn into_record(self) -> CheckinRecord {
        match self {
            InsertOutcome::Inserted(record) | InsertOutcome::Existing(record) => record,
        }
    }
}
