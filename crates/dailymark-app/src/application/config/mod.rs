mod settings;

pub use settings::{AppSettings, CacheBackend, LogLevel, SettingsLoad};
