//! Side channel for problems inside the logging machinery itself.
//!
//! Failed sink writes, failed rotations and retention-sweep errors never travel
//! back to whoever called `submit`; they end up here instead.

use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use crate::log::log_level::LogLevel;

pub trait DiagSink: Send + Sync {
    fn report(&self, level: LogLevel, msg: &str, target: &'static str);
}

/// Drops every diagnostic.
#[derive(Debug, Clone, Default)]
pub struct NoopDiagSink;

impl DiagSink for NoopDiagSink {
    #[inline]
    fn report(&self, _level: LogLevel, _msg: &str, _target: &'static str) {}
}

/// Writes diagnostics to standard error, one line each.
#[derive(Debug, Clone, Default)]
pub struct StderrDiagSink;

impl DiagSink for StderrDiagSink {
    fn report(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = writeln!(io::stderr().lock(), "fanlog[{level}] {target}: {msg}");
    }
}

/// Keeps diagnostics in memory so they can be inspected later.
#[derive(Debug, Default)]
pub struct MemoryDiagSink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryDiagSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything reported so far.
    pub fn take(&self) -> Vec<(LogLevel, String)> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DiagSink for MemoryDiagSink {
    fn report(&self, level: LogLevel, msg: &str, _target: &'static str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, msg.to_owned()));
    }
}
