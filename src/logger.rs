//! Timestamped, color-coded console logging.
//!
//! The logger is a process-wide singleton. [`init`] installs it once at
//! startup; log calls made before that (or from tests) fall back to a default
//! logger printing everything at INFO and above. Use the crate-root macros
//! [`info!`](crate::info), [`warning!`](crate::warning) and
//! [`error!`](crate::error) instead of calling [`log`] directly, they capture
//! the call site.
//!
//! Lines go to stdout unless the logger was built with
//! [`Logger::with_writer`], which receives them without color.
//!
//! A line looks like:
//!
//! ```text
//! 2024-05-02 09:14:11 instances.rs:87 INFO Deleting instance of type un_planet with id: 42
//! ```

use std::{
    fmt,
    io::Write,
    str::FromStr,
    sync::{Mutex, OnceLock},
};

use chrono::{DateTime, Utc};
use colored::Colorize;

pub const LOG_LEVEL_VAR: &str = "CMS_DEMO_LOG_LEVEL";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static LOGGER: OnceLock<Logger> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn name(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    fn colored_name(&self) -> colored::ColoredString {
        match self {
            Level::Info => self.name().green(),
            Level::Warn => self.name().yellow(),
            Level::Error => self.name().red(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

type Sink = Mutex<Box<dyn Write + Send>>;

pub struct Logger {
    min_level: Level,
    sink: Option<Sink>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("stdout", &self.sink.is_none())
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Logger {
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level,
            sink: None,
        }
    }

    /// A logger writing plain lines to `writer` instead of stdout.
    pub fn with_writer(min_level: Level, writer: impl Write + Send + 'static) -> Self {
        Self {
            min_level,
            sink: Some(Mutex::new(Box::new(writer))),
        }
    }

    /// Builds a logger from `CMS_DEMO_LOG_LEVEL`, falling back to INFO when
    /// the variable is unset or unreadable.
    pub fn from_env() -> Self {
        let min_level = std::env::var(LOG_LEVEL_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(Level::Info);
        Self::new(min_level)
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: Level, file: &str, line: u32, message: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }

        let timestamp = Utc::now();
        match &self.sink {
            Some(sink) => {
                // A poisoned or failing sink drops the line.
                if let Ok(mut writer) = sink.lock() {
                    let line = format_line(timestamp, level, file, line, &message.to_string());
                    let _ = writeln!(writer, "{line}");
                }
            }
            None => println!(
                "{} {} {}",
                location_prefix(timestamp, file, line),
                level.colored_name(),
                message
            ),
        }
    }
}

/// Installs the process-wide logger. Returns `false` if one was already set.
pub fn init(logger: Logger) -> bool {
    LOGGER.set(logger).is_ok()
}

pub fn get() -> &'static Logger {
    LOGGER.get_or_init(Logger::default)
}

pub fn log(level: Level, file: &str, line: u32, message: fmt::Arguments<'_>) {
    get().log(level, file, line, message);
}

/// Renders a full log line without color.
pub fn format_line(
    timestamp: DateTime<Utc>,
    level: Level,
    file: &str,
    line: u32,
    message: &str,
) -> String {
    format!(
        "{} {} {}",
        location_prefix(timestamp, file, line),
        level.name(),
        message
    )
}

fn location_prefix(timestamp: DateTime<Utc>, file: &str, line: u32) -> String {
    format!(
        "{} {}:{}",
        timestamp.format(TIMESTAMP_FORMAT),
        file_name(file),
        line
    )
}

// `file!()` yields the path relative to the crate root; only the last
// component is printed.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
