mod checkin_dto;
mod streak_dto;

pub use checkin_dto::{CalendarDto, CheckinRecordDto, CheckinStatusDto};
pub use streak_dto::{MonthStatsDto, StreakStatsDto};
