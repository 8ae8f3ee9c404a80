//! Logging setup.
//!
//! Two sinks:
//! - a daily-rotated file of one-line JSON events (`dailymark.log.YYYY-MM-DD`)
//! - an optional human-readable console sink on stderr, so command output on
//!   stdout stays machine-readable
//!
//! `log` macros are forwarded into `tracing`, so both families end up in the
//! same sinks. Filtering follows `RUST_LOG` when set, otherwise the level
//! passed to [`init_logger`].

use log::LevelFilter;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

const LOG_FILE_PREFIX: &str = "dailymark.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOGGER_READY: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. Calling it again is a no-op.
///
/// `default_level` is an `EnvFilter` directive such as `"info"` or
/// `"warn,dailymark=debug"`, used when `RUST_LOG` is unset or invalid.
pub fn init_logger(log_dir: &Path, default_level: &str, console: bool) -> anyhow::Result<()> {
    if LOGGER_READY.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(log_dir)?;

    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
    let _ = FILE_GUARD.set(guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .event_format(JsonLineFormat::new())
        .with_filter(build_filter(default_level));

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .event_format(ConsoleFormat::new())
            .with_filter(build_filter(default_level))
    });

    let subscriber = Registry::default().with(file_layer).with(console_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    let _ = LOGGER_READY.set(());

    tracing::info!(
        target: "dailymark::logging",
        log_dir = %log_dir.display(),
        level = default_level,
        version = env!("CARGO_PKG_VERSION"),
        "Logger initialized"
    );

    Ok(())
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// One JSON object per line: timestamp, level, target, pid, source location,
/// message and any structured fields under `fields`.
struct JsonLineFormat {
    pid: u32,
}

impl JsonLineFormat {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
        }
    }

    fn render(&self, event: &Event<'_>) -> Value {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let mut line = json!({
            "timestamp": chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            "level": metadata.level().to_string(),
            "target": metadata.target(),
            "pid": self.pid,
            "tid": format!("{:?}", std::thread::current().id()),
            "version": env!("CARGO_PKG_VERSION"),
        });

        if let (Some(file), Some(line_no)) = (metadata.file(), metadata.line()) {
            line["file"] = json!(file);
            line["line"] = json!(line_no);
        }
        if let Some(message) = fields.message {
            line["message"] = json!(message);
        }
        if !fields.values.is_empty() {
            line["fields"] = Value::Object(fields.values);
        }

        line
    }
}

impl<S, N> FormatEvent<S, N> for JsonLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let rendered = serde_json::to_string(&self.render(event)).unwrap_or_default();
        writeln!(writer, "{}", rendered)
    }
}

/// `2024-01-05 10:32:15.123 [INFO] (target) key=value message (file:line)`
struct ConsoleFormat {
    ansi: bool,
}

impl ConsoleFormat {
    fn new() -> Self {
        Self {
            ansi: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    fn level_label(&self, level: &Level) -> String {
        let (label, color) = match *level {
            Level::ERROR => ("ERROR", 31),
            Level::WARN => ("WARN", 33),
            Level::INFO => ("INFO", 32),
            Level::DEBUG => ("DEBUG", 36),
            Level::TRACE => ("TRACE", 35),
        };
        if self.ansi {
            format!("\x1b[{}m{}\x1b[0m", color, label)
        } else {
            label.to_string()
        }
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        write!(
            writer,
            "{} [{}] ({})",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level_label(metadata.level()),
            metadata.target()
        )?;
        for (key, value) in &fields.values {
            match value {
                Value::String(s) => write!(writer, " {}={}", key, s)?,
                other => write!(writer, " {}={}", key, other)?,
            }
        }
        if let Some(message) = &fields.message {
            write!(writer, " {}", message)?;
        }
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            write!(writer, " ({}:{})", file, line)?;
        }
        writeln!(writer)
    }
}

/// Splits an event into its message and the remaining structured fields.
/// Bridged `log` records carry their metadata as `log.*` fields, which are
/// dropped.
#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else if !name.starts_with("log.") {
            self.values.insert(name.to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, json!(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, json!(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, json!(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, json!(format!("{:?}", value)));
    }
}
