use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dailymark", version, about = "Daily check-ins, streaks and calendars")]
pub struct Cli {
    /// Settings file (defaults to <config dir>/dailymark/settings.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Record today's check-in
    Checkin {
        #[arg(long)]
        user: i64,
    },
    /// Whether the user has checked in today
    Status {
        #[arg(long)]
        user: i64,
    },
    /// Checked-in days within an inclusive date window
    Calendar {
        #[arg(long)]
        user: i64,
        #[arg(long, value_name = "YYYY-MM-DD")]
        from: NaiveDate,
        #[arg(long, value_name = "YYYY-MM-DD")]
        to: NaiveDate,
    },
    /// Checked-in days of one month
    Month {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Check-in count and rate for one month
    Summary {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Current and longest streak
    Stats {
        #[arg(long)]
        user: i64,
    },
    /// Rebuild streak statistics from the full history
    Recalc {
        #[arg(long)]
        user: i64,
    },
    /// Add a user id to the local user table
    Register {
        #[arg(long)]
        user: i64,
    },
}
