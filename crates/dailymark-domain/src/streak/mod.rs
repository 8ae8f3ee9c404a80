mod repository;
mod stats;
mod tracker;


pub use repository::StreakRepository;
pub use stats::{StreakStats, StreakTransition};
pub use tracker::StreakTracker;
