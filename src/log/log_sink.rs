use crate::log::{log_level::LogLevel, sink_error::SinkError};

/// An output destination the dispatcher fans records out to.
///
/// Methods take `&self`: the dispatcher shares sinks between its delivery loop
/// and the threads calling `flush`/`remove_sink`, so every implementation
/// serializes its own I/O internally.
pub trait LogSink: Send + Sync {
    /// Writes one record. Records below the sink's own threshold are dropped
    /// and reported as success.
    fn write(&self, text: &str, level: LogLevel) -> Result<(), SinkError>;

    /// Pushes buffered data down to the underlying device.
    fn flush(&self) -> Result<(), SinkError>;

    /// Releases the underlying handle. Later writes fail with
    /// [`SinkError::SinkClosed`].
    fn close(&self);
}
