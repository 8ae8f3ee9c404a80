use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dailymark_domain::streak::StreakStats;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreakStatsDto {
    pub user_id: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_checkin_date: Option<NaiveDate>,
}

impl From<StreakStats> for StreakStatsDto {
    fn from(stats: StreakStats) -> Self {
        Self {
            user_id: stats.user_id().value(),
            current_streak: stats.current_streak(),
            longest_streak: stats.longest_streak(),
            last_checkin_date: stats.last_checkin_date(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthStatsDto {
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub total_days: u32,
    pub checked_in_days: u32,
    pub check_in_rate: f64, // percent, 0.0 - 100.0
}
