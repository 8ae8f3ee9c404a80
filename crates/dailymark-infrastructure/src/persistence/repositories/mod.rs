pub mod checkin_log_repo;
pub mod streak_repo;
pub mod user_directory_repo;

pub use checkin_log_repo::SqliteCheckinLogRepository;
pub use streak_repo::SqliteStreakRepository;
pub use user_directory_repo::SqliteUserDirectory;
