use std::{fmt, str::FromStr};

/// Defines the severity levels for log messages.
///
/// Variants are declared from least to most severe, so the derived ordering
/// is the severity ordering used by every threshold check in the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Designates very fine-grained informational events.
    Trace,
    /// Designates fine-grained informational events that are most useful to debug an application.
    Debug,
    /// Designates informational messages that highlight the progress of the application at coarse-grained level.
    Info,
    /// Designates potentially harmful situations.
    Warn,
    /// Designates error events that might still allow the application to continue running.
    Error,
    /// Designates severe errors that leave part of the application unusable.
    Critical,
    /// Designates errors after which the process terminates.
    Fatal,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::Fatal,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Bracketed one-letter tag prepended to every message, e.g. `[W] `.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Trace => "[T] ",
            LogLevel::Debug => "[D] ",
            LogLevel::Info => "[I] ",
            LogLevel::Warn => "[W] ",
            LogLevel::Error => "[E] ",
            LogLevel::Critical => "[C] ",
            LogLevel::Fatal => "[F] ",
        }
    }

    /// Levels at or above this one get caller context attached.
    #[must_use]
    pub fn wants_caller_context(&self) -> bool {
        *self >= LogLevel::Error
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a level name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|lvl| lvl.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseLevelError(s.to_owned()))
    }
}
