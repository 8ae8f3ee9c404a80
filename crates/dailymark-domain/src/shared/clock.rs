use chrono::{Datelike, NaiveDate};
use std::sync::atomic::{AtomicI32, Ordering};

/// Source of "today" for every date-sensitive operation.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock pinned to a settable date. Used by tests and replay tooling.
#[derive(Debug)]
pub struct FixedClock {
    days_from_ce: AtomicI32,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            days_from_ce: AtomicI32::new(today.num_days_from_ce()),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        self.days_from_ce
            .store(today.num_days_from_ce(), Ordering::SeqCst);
    }

    /// Move the clock forward (or backward for negative values).
    pub fn advance_days(&self, days: i32) {
        self.days_from_ce.fetch_add(days, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        NaiveDate::from_num_days_from_ce_opt(self.days_from_ce.load(Ordering::SeqCst))
            .unwrap_or_default()
    }
}
