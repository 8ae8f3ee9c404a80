mod record;
mod repository;


pub use record::{CheckinRecord, InsertOutcome};
pub use repository::CheckinLog;
