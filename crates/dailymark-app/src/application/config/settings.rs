use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use dailymark_infrastructure::clock::ClockZone;

const APP_DIR: &str = "dailymark";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

/// Log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Where presence bits live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis {
        url: String,
    },
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// SQLite file, or `:memory:` for a throwaway database
    pub database_path: PathBuf,
    pub cache: CacheBackend,
    /// `local`, `utc` or a fixed offset such as `+08:00`
    pub timezone: String,
    /// Reject ids missing from the `users` table
    pub require_known_users: bool,
    pub max_calendar_days: u32,
    pub cache_timeout_ms: u64,
    pub log_level: LogLevel,
    pub log_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            database_path: data_dir.join("dailymark.db"),
            cache: CacheBackend::default(),
            timezone: ClockZone::Local.to_string(),
            require_known_users: false,
            max_calendar_days: 3660,
            cache_timeout_ms: 250,
            log_level: LogLevel::default(),
            log_dir: data_dir.join("logs"),
        }
    }
}

/// Settings plus the problems met while loading them. Loading runs before
/// the logger exists, so warnings are handed back to be logged later.
#[derive(Debug)]
pub struct SettingsLoad {
    pub settings: AppSettings,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl AppSettings {
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Defaults, then the JSON file, then `DAILYMARK_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> SettingsLoad {
        let mut warnings = Vec::new();
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);

        let (mut settings, source) = match path {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(settings) => (settings, Some(path)),
                Err(e) => {
                    warnings.push(format!(
                        "Ignoring settings file {}: {}",
                        path.display(),
                        e
                    ));
                    (Self::default(), None)
                }
            },
            Some(path) if explicit_path.is_some() => {
                warnings.push(format!(
                    "Settings file {} not found, using defaults",
                    path.display()
                ));
                (Self::default(), None)
            }
            _ => (Self::default(), None),
        };

        warnings.extend(settings.apply_overrides(|key| std::env::var(key).ok()));

        SettingsLoad {
            settings,
            source,
            warnings,
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Apply environment overrides read through `lookup`. Invalid values are
    /// skipped and reported.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(path) = lookup("DAILYMARK_DATABASE").filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }

        let redis_url = lookup("DAILYMARK_REDIS_URL").filter(|v| !v.trim().is_empty());
        let backend = lookup("DAILYMARK_CACHE").map(|v| v.trim().to_ascii_lowercase());
        match backend.as_deref() {
            Some("memory") => self.cache = CacheBackend::Memory,
            Some("disabled") => self.cache = CacheBackend::Disabled,
            Some("redis") => {
                let url = match (&redis_url, &self.cache) {
                    (Some(url), _) => url.clone(),
                    (None, CacheBackend::Redis { url }) => url.clone(),
                    (None, _) => DEFAULT_REDIS_URL.to_string(),
                };
                self.cache = CacheBackend::Redis { url };
            }
            Some(other) => warnings.push(format!(
                "Ignoring DAILYMARK_CACHE={}: expected memory, redis or disabled",
                other
            )),
            None => {
                if let (Some(url), CacheBackend::Redis { .. }) = (&redis_url, &self.cache) {
                    self.cache = CacheBackend::Redis { url: url.clone() };
                }
            }
        }

        if let Some(zone) = lookup("DAILYMARK_TIMEZONE") {
            match ClockZone::parse(&zone) {
                Ok(parsed) => self.timezone = parsed.to_string(),
                Err(e) => warnings.push(format!("Ignoring DAILYMARK_TIMEZONE: {}", e)),
            }
        }

        if let Some(level) = lookup("DAILYMARK_LOG_LEVEL") {
            match LogLevel::parse(&level) {
                Some(parsed) => self.log_level = parsed,
                None => warnings.push(format!(
                    "Ignoring DAILYMARK_LOG_LEVEL={}: expected error, warn, info, debug or trace",
                    level
                )),
            }
        }

        warnings
    }

    /// Configured zone, falling back to local time for an unparsable value.
    pub fn clock_zone(&self) -> ClockZone {
        ClockZone::parse(&self.timezone).unwrap_or_default()
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn is_in_memory_database(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}
