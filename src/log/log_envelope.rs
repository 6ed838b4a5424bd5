use crate::log::log_level::LogLevel;

/// Represents a single queued log call.
///
/// An envelope is built once on the caller's thread, consumed exactly once by
/// the dispatcher loop, and then handed read-only to every registered sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEnvelope {
    /// Caller frames to unwind when caller context was captured.
    pub skip: usize,
    /// The severity level of the log.
    pub level: LogLevel,
    /// Fully rendered text: level tag, optional caller context, message.
    pub text: String,
}

impl LogEnvelope {
    /// Creates a new `LogEnvelope`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fanlog::log::{LogEnvelope, LogLevel};
    ///
    /// let env = LogEnvelope::new(0, LogLevel::Info, "[I] connection established");
    /// assert_eq!(env.level, LogLevel::Info);
    /// ```
    pub fn new(skip: usize, level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            skip,
            level,
            text: text.into(),
        }
    }
}
