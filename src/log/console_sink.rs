use std::{
    io::{self, Write},
    sync::Mutex,
};

use chrono::Local;

use crate::log::{lock, log_level::LogLevel, log_sink::LogSink, sink_error::SinkError};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const RESET: &str = "\x1b[0m";

/// ANSI colour per level: cyan, blue, green, yellow, red, purple, red.
fn colour(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "\x1b[1;36m",
        LogLevel::Debug => "\x1b[1;34m",
        LogLevel::Info => "\x1b[1;32m",
        LogLevel::Warn => "\x1b[1;33m",
        LogLevel::Error => "\x1b[1;31m",
        LogLevel::Critical => "\x1b[1;35m",
        LogLevel::Fatal => "\x1b[1;31m",
    }
}

/// Writes coloured, timestamped records to a stream (stdout by default).
pub struct ConsoleSink {
    out: Mutex<Option<Box<dyn Write + Send>>>,
    min_level: LogLevel,
}

impl ConsoleSink {
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()), LogLevel::Trace)
    }

    /// Writes to any stream, e.g. a buffer in tests.
    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>, min_level: LogLevel) -> Self {
        Self {
            out: Mutex::new(Some(out)),
            min_level,
        }
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, text: &str, level: LogLevel) -> Result<(), SinkError> {
        if level < self.min_level {
            return Ok(());
        }
        let mut out = lock(&self.out);
        let out = out.as_mut().ok_or(SinkError::SinkClosed)?;
        writeln!(
            out,
            "{} {}{text}{RESET}",
            Local::now().format(TIMESTAMP_FORMAT),
            colour(level)
        )?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut out = lock(&self.out);
        out.as_mut().ok_or(SinkError::SinkClosed)?.flush()?;
        Ok(())
    }

    fn close(&self) {
        if let Some(mut out) = lock(&self.out).take() {
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn records_are_coloured_by_level() {
        let buf = SharedBuf::default();
        let sink = ConsoleSink::with_writer(Box::new(buf.clone()), LogLevel::Trace);

        sink.write("[W] careful", LogLevel::Warn).unwrap();
        sink.write("[C] on fire", LogLevel::Critical).unwrap();

        let out = buf.text();
        assert!(out.contains("\x1b[1;33m[W] careful\x1b[0m\n"), "{out:?}");
        assert!(out.contains("\x1b[1;35m[C] on fire\x1b[0m\n"), "{out:?}");
    }

    #[test]
    fn records_below_threshold_are_skipped() {
        let buf = SharedBuf::default();
        let sink = ConsoleSink::with_writer(Box::new(buf.clone()), LogLevel::Info);

        sink.write("[D] hidden", LogLevel::Debug).unwrap();

        assert!(buf.text().is_empty());
    }

    #[test]
    fn write_after_close_fails() {
        let sink = ConsoleSink::with_writer(Box::new(SharedBuf::default()), LogLevel::Trace);
        sink.close();
        assert!(matches!(sink.write("x", LogLevel::Info), Err(SinkError::SinkClosed)));
    }
}
