use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::application::dtos::{
    CalendarDto, CheckinRecordDto, CheckinStatusDto, MonthStatsDto, StreakStatsDto,
};
use crate::application::services::{month_bounds, MonthSummary};
use crate::presentation::cli::Command;
use crate::presentation::error::CommandError;
use crate::presentation::state::AppState;
use dailymark_domain::shared::UserId;

/// Run one CLI command against the wired application and return its JSON
/// payload.
pub async fn execute(state: &AppState, command: Command) -> Result<Value, CommandError> {
    let orchestrator = &state.services.orchestrator;
    debug!(?command, "executing command");

    match command {
        Command::Checkin { user } => {
            let record = orchestrator.checkin_today(UserId::new(user)).await?;
            to_json(CheckinRecordDto::from(record))
        }
        Command::Status { user } => {
            let checked_in = orchestrator.has_checked_in_today(UserId::new(user)).await?;
            to_json(CheckinStatusDto {
                user_id: user,
                date: orchestrator.today(),
                checked_in,
            })
        }
        Command::Calendar { user, from, to } => {
            let days = orchestrator.calendar(UserId::new(user), from, to).await?;
            to_json(CalendarDto::new(user, from, to, days))
        }
        Command::Month { user, year, month } => {
            let days = orchestrator
                .month_calendar(UserId::new(user), year, month)
                .await?;
            let (start, end) = month_bounds(year, month)?;
            to_json(CalendarDto::new(user, start, end, days))
        }
        Command::Summary { user, year, month } => {
            let summary = orchestrator
                .month_summary(UserId::new(user), year, month)
                .await?;
            to_json(month_stats(user, summary))
        }
        Command::Stats { user } => {
            let stats = orchestrator.stats(UserId::new(user)).await?;
            to_json(StreakStatsDto::from(stats))
        }
        Command::Recalc { user } => {
            let stats = orchestrator.recalculate_stats(UserId::new(user)).await?;
            to_json(StreakStatsDto::from(stats))
        }
        Command::Register { user } => {
            state.repositories.users.register(UserId::new(user)).await?;
            Ok(json!({ "user_id": user, "registered": true }))
        }
    }
}

fn month_stats(user: i64, summary: MonthSummary) -> MonthStatsDto {
    MonthStatsDto {
        user_id: user,
        year: summary.year,
        month: summary.month,
        total_days: summary.total_days,
        checked_in_days: summary.checked_in_days,
        check_in_rate: (summary.check_in_rate() * 100.0).round() / 100.0,
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, CommandError> {
    Ok(serde_json::to_value(value)?)
}
