use chrono::{DateTime, Local};

/// Source of wall-clock time for timestamps, rotated filenames and the
/// daily-rollover check.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Reads the local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
