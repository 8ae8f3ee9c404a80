use chrono::{FixedOffset, Local, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

use dailymark_domain::shared::{Clock, DomainError};

/// Zone in which "today" is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ClockZone {
    /// Accepts `local`, `utc` (or `z`), or a fixed offset like `+08:00`.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" | "" => Ok(Self::Local),
            "utc" | "z" => Ok(Self::Utc),
            _ => FixedOffset::from_str(trimmed).map(Self::Fixed).map_err(|_| {
                DomainError::InvalidInput(format!(
                    "Unknown timezone '{}': expected local, utc or an offset like +08:00",
                    value
                ))
            }),
        }
    }
}

impl fmt::Display for ClockZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Utc => write!(f, "utc"),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Wall clock in a configured zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    zone: ClockZone,
}

impl SystemClock {
    pub fn new(zone: ClockZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> ClockZone {
        self.zone
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.zone {
            ClockZone::Local => Local::now().date_naive(),
            ClockZone::Utc => Utc::now().date_naive(),
            ClockZone::Fixed(offset) => Utc::now().with_timezone(&offset).date_naive(),
        }
    }
}
