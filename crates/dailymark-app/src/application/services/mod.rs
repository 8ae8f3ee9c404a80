mod checkin_orchestrator;

pub use checkin_orchestrator::{
    month_bounds, CheckinOrchestrator, MonthSummary, DEFAULT_MAX_CALENDAR_DAYS,
};
