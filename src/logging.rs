//! Structured console logging for the measurement engine
//!
//! Each session gets a correlation id so interleaved output from the engine
//! and the presentation adapter can be tied back to one run.

use crate::error::{AppError, Result};
use chrono::Utc;
use colored::Colorize;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Console logger carried by the engine and its phases
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    session_id: Uuid,
}

impl Logger {
    /// Create a logger with a fresh session correlation id
    pub fn new(min_level: LogLevel, use_color: bool) -> Self {
        Self {
            min_level,
            use_color,
            session_id: Uuid::new_v4(),
        }
    }

    /// Logger that swallows everything below Error; used as the default
    /// when the adapter did not ask for verbosity.
    pub fn quiet() -> Self {
        Self::new(LogLevel::Error, false)
    }

    /// The correlation id stamped on every line from this session
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn debug(&self, component: &str, message: &str) {
        self.log(LogLevel::Debug, component, message);
    }

    pub fn info(&self, component: &str, message: &str) {
        self.log(LogLevel::Info, component, message);
    }

    pub fn warn(&self, component: &str, message: &str) {
        self.log(LogLevel::Warn, component, message);
    }

    pub fn error(&self, component: &str, message: &str) {
        self.log(LogLevel::Error, component, message);
    }

    fn log(&self, level: LogLevel, component: &str, message: &str) {
        if level < self.min_level {
            return;
        }
        eprintln!("{}", self.format_line(level, component, message));
    }

    fn format_line(&self, level: LogLevel, component: &str, message: &str) -> String {
        let timestamp = Utc::now().format("%H:%M:%S%.3f");
        let short_id = &self.session_id.to_string()[..8];
        if self.use_color {
            let tag = match level {
                LogLevel::Debug => level.as_str().cyan(),
                LogLevel::Info => level.as_str().green(),
                LogLevel::Warn => level.as_str().yellow(),
                LogLevel::Error => level.as_str().red(),
            };
            format!("{} [{}] {} {}: {}", timestamp, short_id, tag, component, message)
        } else {
            format!(
                "{} [{}] {} {}: {}",
                timestamp,
                short_id,
                level.as_str(),
                component,
                message
            )
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info, true)
    }
}
