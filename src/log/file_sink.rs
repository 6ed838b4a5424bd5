//! Rotating file sink.
//!
//! The sink owns one append-mode handle at the configured path. Before each
//! record lands it checks the line, byte and calendar-day limits; when one is
//! hit the active file is renamed to `<path>.<YYYY-MM-DD>.<NNN>` and a fresh
//! file is opened in its place. A detached thread then deletes siblings that
//! share the file name prefix and are older than the retention window.
//!
//! Locking: `counters` is the rotation lock and `file` is the write lock.
//! Writers take `counters` first and hold it across the write, so a record can
//! never land in a file that is halfway through a rename. `flush` and `close`
//! only take `file`.
//!
//! An empty handle slot only means "closed" once `close` has run. A failed
//! reopen during rotation leaves the slot empty too, and the next write tries
//! to open the active path again.

use std::{
    ffi::{OsStr, OsString},
    fs::{self, DirEntry, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, SystemTime},
};

use chrono::{DateTime, Local, NaiveDate};

use crate::{
    diag_error, diag_warn,
    log::{
        clock::{Clock, SystemClock},
        diag_sink::DiagSink,
        lock,
        log_level::LogLevel,
        log_sink::LogSink,
        sink_error::SinkError,
    },
};

pub const DEFAULT_PATH: &str = "log/log.log";
pub const DEFAULT_MAX_LINES: u64 = 10_000;
/// 256 MiB
pub const DEFAULT_MAX_BYTES: u64 = 1 << 28;
pub const DEFAULT_MAX_RETENTION_DAYS: u64 = 7;

const MAX_ROTATION_SEQUENCE: u32 = 999;
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const ROTATED_DATE_FORMAT: &str = "%Y-%m-%d";
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Settings consumed when the sink is opened.
///
/// A limit of `0` disables that limit. `max_retention_days == 0` disables the
/// retention sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub path: PathBuf,
    pub max_lines: u64,
    pub max_bytes: u64,
    pub daily_rotation: bool,
    pub max_retention_days: u64,
    pub rotation_enabled: bool,
    pub min_level: LogLevel,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            max_lines: DEFAULT_MAX_LINES,
            max_bytes: DEFAULT_MAX_BYTES,
            daily_rotation: true,
            max_retention_days: DEFAULT_MAX_RETENTION_DAYS,
            rotation_enabled: true,
            min_level: LogLevel::Trace,
        }
    }
}

impl FileSinkConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_max_lines(mut self, max_lines: u64) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_daily_rotation(mut self, daily_rotation: bool) -> Self {
        self.daily_rotation = daily_rotation;
        self
    }

    pub fn with_max_retention_days(mut self, days: u64) -> Self {
        self.max_retention_days = days;
        self
    }

    pub fn with_rotation_enabled(mut self, rotation_enabled: bool) -> Self {
        self.rotation_enabled = rotation_enabled;
        self
    }

    pub fn with_min_level(mut self, min_level: LogLevel) -> Self {
        self.min_level = min_level;
        self
    }
}

/// Accounting for the currently open file.
#[derive(Debug, Clone, Copy)]
struct Counters {
    lines: u64,
    bytes: u64,
    day_opened: NaiveDate,
}

impl Counters {
    fn fresh(day_opened: NaiveDate) -> Self {
        Self {
            lines: 0,
            bytes: 0,
            day_opened,
        }
    }
}

pub struct RotatingFileSink {
    config: FileSinkConfig,
    file: Mutex<Option<File>>,
    closed: AtomicBool,
    counters: Mutex<Counters>,
    clock: Arc<dyn Clock>,
    diag: Arc<dyn DiagSink>,
}

impl RotatingFileSink {
    /// Opens (or creates) the active file and re-derives the counters from
    /// whatever it already contains.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the parent directory cannot be created or
    /// the file cannot be opened or read.
    pub fn open(config: FileSinkConfig, diag: Arc<dyn DiagSink>) -> Result<Self, SinkError> {
        Self::open_with_clock(config, Arc::new(SystemClock), diag)
    }

    /// Same as [`open`](Self::open) with an explicit time source.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_with_clock(
        config: FileSinkConfig,
        clock: Arc<dyn Clock>,
        diag: Arc<dyn DiagSink>,
    ) -> Result<Self, SinkError> {
        let file = open_active(&config.path)?;
        let counters = measure(&config.path, &file, clock.now().date_naive())?;

        Ok(Self {
            config,
            file: Mutex::new(Some(file)),
            closed: AtomicBool::new(false),
            counters: Mutex::new(counters),
            clock,
            diag,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Records written to the active file since it was opened or rotated.
    #[must_use]
    pub fn line_count(&self) -> u64 {
        lock(&self.counters).lines
    }

    /// Bytes written to the active file since it was opened or rotated.
    #[must_use]
    pub fn byte_count(&self) -> u64 {
        lock(&self.counters).bytes
    }

    /// `true` while a handle to the active file is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        lock(&self.file).is_some()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn should_rotate(&self, counters: &Counters, today: NaiveDate) -> bool {
        let cfg = &self.config;
        cfg.rotation_enabled
            && ((cfg.max_lines > 0 && counters.lines >= cfg.max_lines)
                || (cfg.max_bytes > 0 && counters.bytes >= cfg.max_bytes)
                || (cfg.daily_rotation && today != counters.day_opened))
    }

    /// Rotates if a limit is hit, then charges `size` bytes and one record
    /// to whichever file the record is about to land in.
    fn check_rotation(&self, counters: &mut Counters, size: u64, now: DateTime<Local>) {
        let today = now.date_naive();
        if self.should_rotate(counters, today) {
            match self.rotate(today) {
                Ok(()) => *counters = Counters::fresh(today),
                Err(e) => diag_error!(
                    self.diag,
                    "rotating {:?} failed, still writing to it: {e}",
                    self.path()
                ),
            }
        }
        counters.lines += 1;
        counters.bytes += size;
    }

    fn rotate(&self, today: NaiveDate) -> Result<(), SinkError> {
        let path = self.path();
        let mut file = lock(&self.file);
        if self.is_closed() {
            return Err(SinkError::SinkClosed);
        }

        if fs::symlink_metadata(path).is_err() {
            // Removed behind our back: the old handle points at an unlinked
            // file, so nothing to rename. Start a new one.
            drop(file.take());
            *file = Some(open_active(path)?);
            return Ok(());
        }

        let target = free_rotated_name(path, today)?;

        drop(file.take());
        if let Err(e) = fs::rename(path, &target) {
            *file = Some(open_active(path)?);
            return Err(e.into());
        }
        *file = Some(open_active(path)?);
        drop(file);

        self.spawn_sweep();
        Ok(())
    }

    fn spawn_sweep(&self) {
        if self.config.max_retention_days == 0 {
            return;
        }
        let Some(prefix) = self.path().file_name().map(ToOwned::to_owned) else {
            return;
        };
        let dir = log_dir(self.path());
        let max_age = Duration::from_secs(self.config.max_retention_days.saturating_mul(SECS_PER_DAY));
        let diag = Arc::clone(&self.diag);

        let spawned = thread::Builder::new()
            .name("fanlog-sweep".into())
            .spawn(move || {
                sweep_expired(&dir, &prefix, max_age, SystemTime::now(), diag.as_ref());
            });
        if let Err(e) = spawned {
            diag_warn!(self.diag, "could not start retention sweep: {e}");
        }
    }
}

impl LogSink for RotatingFileSink {
    fn write(&self, text: &str, level: LogLevel) -> Result<(), SinkError> {
        if level < self.config.min_level {
            return Ok(());
        }

        let now = self.clock.now();
        let line = format!("{} {}\n", now.format(TIMESTAMP_FORMAT), text);

        let size = line.len() as u64;
        let mut counters = lock(&self.counters);
        if self.is_closed() {
            return Err(SinkError::SinkClosed);
        }
        self.check_rotation(&mut counters, size, now);

        let mut file = lock(&self.file);
        if file.is_none() {
            if self.is_closed() {
                return Err(SinkError::SinkClosed);
            }
            // Lost during a failed rotation; the path may be usable again.
            let fd = open_active(self.path())?;
            *counters = measure(self.path(), &fd, now.date_naive())?;
            counters.lines += 1;
            counters.bytes += size;
            *file = Some(fd);
        }
        let fd = file.as_mut().ok_or(SinkError::SinkClosed)?;
        fd.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let file = lock(&self.file);
        if self.is_closed() {
            return Err(SinkError::SinkClosed);
        }
        // Nothing buffered when the handle was lost; the next write reopens.
        if let Some(fd) = file.as_ref() {
            fd.sync_all()?;
        }
        Ok(())
    }

    fn close(&self) {
        let mut file = lock(&self.file);
        self.closed.store(true, Ordering::Release);
        drop(file.take());
    }
}

/// Builds `<path>.<YYYY-MM-DD>.<NNN>`.
#[must_use]
pub fn rotated_name(path: &Path, day: NaiveDate, seq: u32) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(".{}.{seq:03}", day.format(ROTATED_DATE_FORMAT)));
    PathBuf::from(name)
}

fn free_rotated_name(path: &Path, day: NaiveDate) -> Result<PathBuf, SinkError> {
    (1..=MAX_ROTATION_SEQUENCE)
        .map(|seq| rotated_name(path, day, seq))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .ok_or_else(|| SinkError::RotationExhausted {
            path: path.to_path_buf(),
        })
}

fn log_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn open_active(path: &Path) -> io::Result<File> {
    fs::create_dir_all(log_dir(path))?;
    OpenOptions::new().create(true).append(true).open(path)
}

fn measure(path: &Path, file: &File, today: NaiveDate) -> io::Result<Counters> {
    let bytes = file.metadata()?.len();
    let lines = if bytes > 0 { count_records(path)? } else { 0 };
    Ok(Counters {
        lines,
        bytes,
        day_opened: today,
    })
}

/// Number of newline-delimited records; a missing final newline still counts
/// as a record.
fn count_records(path: &Path) -> io::Result<u64> {
    BufReader::new(File::open(path)?)
        .split(b'\n')
        .try_fold(0u64, |n, record| record.map(|_| n + 1))
}

/// Deletes files in `dir` whose name starts with `prefix` and whose
/// modification time is more than `max_age` before `now`. The file named
/// exactly `prefix` (the active file) is never touched.
///
/// Per-file failures are reported to `diag` and the sweep moves on. Returns
/// the number of files removed.
pub fn sweep_expired(
    dir: &Path,
    prefix: &OsStr,
    max_age: Duration,
    now: SystemTime,
    diag: &dyn DiagSink,
) -> usize {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return 0;
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            diag_warn!(diag, "retention sweep cannot read {}: {e}", dir.display());
            return 0;
        }
    };
    let prefix = prefix.to_string_lossy();

    let mut removed = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                diag_warn!(diag, "retention sweep skipped an entry in {}: {e}", dir.display());
                continue;
            }
        };
        match remove_if_expired(&entry, &prefix, cutoff) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => diag_warn!(
                diag,
                "unable to delete old log '{}': {e}",
                entry.path().display()
            ),
        }
    }
    removed
}

fn remove_if_expired(entry: &DirEntry, prefix: &str, cutoff: SystemTime) -> io::Result<bool> {
    let name = entry.file_name();
    let name = name.to_string_lossy();
    if name == prefix || !name.starts_with(prefix) {
        return Ok(false);
    }
    let meta = entry.metadata()?;
    if meta.is_dir() || meta.modified()? >= cutoff {
        return Ok(false);
    }
    fs::remove_file(entry.path())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::{clock::testing::ManualClock, diag_sink::MemoryDiagSink};

    const STAMP_LEN: usize = "2006/01/02 15:04:05 ".len();

    fn records(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l[STAMP_LEN..].to_owned())
            .collect()
    }

    fn sink_with(
        cfg: FileSinkConfig,
    ) -> (RotatingFileSink, Arc<ManualClock>, Arc<MemoryDiagSink>) {
        let clock = Arc::new(ManualClock::starting_now());
        let diag = Arc::new(MemoryDiagSink::new());
        let sink = RotatingFileSink::open_with_clock(cfg, clock.clone(), diag.clone()).unwrap();
        (sink, clock, diag)
    }

    fn line_limited(path: &Path, max_lines: u64) -> FileSinkConfig {
        FileSinkConfig::default()
            .with_path(path)
            .with_max_lines(max_lines)
            .with_daily_rotation(false)
    }

    #[test]
    fn fourth_record_rotates_three_line_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, clock, diag) = sink_with(line_limited(&path, 3));

        for text in ["a", "b", "c", "d"] {
            sink.write(text, LogLevel::Info).unwrap();
        }

        let rotated = rotated_name(&path, clock.now().date_naive(), 1);
        assert_eq!(records(&rotated), ["a", "b", "c"]);
        assert_eq!(records(&path), ["d"]);
        assert_eq!(sink.line_count(), 1);
        assert!(diag.take().is_empty());
    }

    #[test]
    fn counters_reset_before_triggering_record_is_charged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, _clock, _diag) = sink_with(line_limited(&path, 2));

        sink.write("one", LogLevel::Info).unwrap();
        sink.write("two", LogLevel::Info).unwrap();
        assert_eq!(sink.line_count(), 2);

        sink.write("three", LogLevel::Info).unwrap();
        let active_len = fs::metadata(&path).unwrap().len();
        assert_eq!(sink.line_count(), 1);
        assert_eq!(sink.byte_count(), active_len);
    }

    #[test]
    fn same_day_rotations_take_increasing_sequence_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, clock, _diag) = sink_with(line_limited(&path, 1));

        for text in ["a", "b", "c"] {
            sink.write(text, LogLevel::Info).unwrap();
        }

        let today = clock.now().date_naive();
        assert_eq!(records(&rotated_name(&path, today, 1)), ["a"]);
        assert_eq!(records(&rotated_name(&path, today, 2)), ["b"]);
        assert_eq!(records(&path), ["c"]);
    }

    #[test]
    fn rotated_name_is_zero_padded() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let name = rotated_name(Path::new("log/log.log"), day, 7);
        assert_eq!(name, PathBuf::from("log/log.log.2024-03-09.007"));
    }

    #[test]
    fn reopening_counts_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "x\ny\nz\n").unwrap();

        let (sink, _clock, _diag) = sink_with(line_limited(&path, 100));
        assert_eq!(sink.line_count(), 3);
        assert_eq!(sink.byte_count(), 6);

        fs::write(&path, "x\ny").unwrap();
        let (sink, _clock, _diag) = sink_with(line_limited(&path, 100));
        assert_eq!(sink.line_count(), 2);
    }

    #[test]
    fn reopened_file_rotates_at_the_limit_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        {
            let (sink, _clock, _diag) = sink_with(line_limited(&path, 3));
            sink.write("a", LogLevel::Info).unwrap();
            sink.write("b", LogLevel::Info).unwrap();
        }

        let (sink, clock, _diag) = sink_with(line_limited(&path, 3));
        sink.write("c", LogLevel::Info).unwrap();
        sink.write("d", LogLevel::Info).unwrap();

        let rotated = rotated_name(&path, clock.now().date_naive(), 1);
        assert_eq!(records(&rotated), ["a", "b", "c"]);
        assert_eq!(records(&path), ["d"]);
    }

    #[test]
    fn byte_limit_triggers_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let cfg = FileSinkConfig::default()
            .with_path(&path)
            .with_max_lines(0)
            .with_max_bytes(10)
            .with_daily_rotation(false);
        let (sink, clock, _diag) = sink_with(cfg);

        sink.write("first record is long enough", LogLevel::Info).unwrap();
        sink.write("second", LogLevel::Info).unwrap();

        let rotated = rotated_name(&path, clock.now().date_naive(), 1);
        assert_eq!(records(&rotated), ["first record is long enough"]);
        assert_eq!(records(&path), ["second"]);
    }

    #[test]
    fn day_rollover_rotates_into_previous_day_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let cfg = FileSinkConfig::default()
            .with_path(&path)
            .with_max_lines(0)
            .with_max_bytes(0)
            .with_daily_rotation(true);
        let (sink, clock, _diag) = sink_with(cfg);

        sink.write("yesterday", LogLevel::Info).unwrap();
        clock.advance(chrono::Duration::days(1));
        let today = clock.now().date_naive();
        sink.write("today", LogLevel::Info).unwrap();

        assert_eq!(records(&rotated_name(&path, today, 1)), ["yesterday"]);
        assert_eq!(records(&path), ["today"]);
    }

    #[test]
    fn disabled_rotation_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, _clock, _diag) = sink_with(line_limited(&path, 1).with_rotation_enabled(false));

        for text in ["a", "b", "c"] {
            sink.write(text, LogLevel::Info).unwrap();
        }

        assert_eq!(records(&path), ["a", "b", "c"]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn records_below_min_level_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, _clock, _diag) = sink_with(line_limited(&path, 0).with_min_level(LogLevel::Warn));

        for lvl in LogLevel::ALL {
            sink.write(lvl.as_str(), lvl).unwrap();
        }

        assert_eq!(records(&path), ["WARN", "ERROR", "CRITICAL", "FATAL"]);
    }

    #[test]
    fn exhausted_sequence_keeps_writing_to_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, clock, diag) = sink_with(line_limited(&path, 1));
        let today = clock.now().date_naive();
        for seq in 1..=MAX_ROTATION_SEQUENCE {
            fs::write(rotated_name(&path, today, seq), "").unwrap();
        }

        sink.write("a", LogLevel::Info).unwrap();
        sink.write("b", LogLevel::Info).unwrap();

        assert_eq!(records(&path), ["a", "b"]);
        let reported = diag.take();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].0, LogLevel::Error);
        assert!(reported[0].1.contains("no free sequence number"), "{reported:?}");
    }

    #[test]
    fn missing_active_file_is_recreated_on_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, _clock, diag) = sink_with(line_limited(&path, 1));

        sink.write("a", LogLevel::Info).unwrap();
        fs::remove_file(&path).unwrap();
        sink.write("b", LogLevel::Info).unwrap();

        assert_eq!(records(&path), ["b"]);
        assert!(diag.take().is_empty());
    }

    #[test]
    fn lost_handle_is_reopened_by_a_later_write() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let path = sub.join("app.log");
        let (sink, _clock, diag) = sink_with(line_limited(&path, 1));
        sink.write("a", LogLevel::Info).unwrap();

        // A plain file where the log directory was makes every reopen fail.
        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, "").unwrap();
        let err = sink.write("b", LogLevel::Info).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)), "{err:?}");
        assert!(!sink.is_open());
        assert_eq!(diag.take().len(), 1);

        fs::remove_file(&sub).unwrap();
        sink.write("c", LogLevel::Info).unwrap();
        sink.flush().unwrap();

        assert!(sink.is_open());
        assert_eq!(records(&path), ["c"]);
        assert_eq!(sink.line_count(), 1);
    }

    #[test]
    fn rotation_sweeps_expired_siblings_in_the_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let expired = dir.path().join("app.log.2020-01-01.001");
        fs::write(&expired, "old\n").unwrap();
        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * SECS_PER_DAY);
        filetime::set_file_mtime(&expired, filetime::FileTime::from_system_time(ten_days_ago))
            .unwrap();
        let (sink, clock, _diag) = sink_with(line_limited(&path, 1).with_max_retention_days(7));

        sink.write("a", LogLevel::Info).unwrap();
        sink.write("b", LogLevel::Info).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while expired.exists() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!expired.exists());
        assert!(rotated_name(&path, clock.now().date_naive(), 1).exists());
        assert_eq!(records(&path), ["b"]);
    }

    #[test]
    fn write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (sink, _clock, _diag) = sink_with(line_limited(&path, 0));

        sink.close();

        assert!(!sink.is_open());
        assert!(matches!(sink.write("late", LogLevel::Info), Err(SinkError::SinkClosed)));
        assert!(matches!(sink.flush(), Err(SinkError::SinkClosed)));
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let (sink, _clock, _diag) = sink_with(line_limited(&path, 0));

        sink.write("hello", LogLevel::Info).unwrap();
        sink.flush().unwrap();

        assert_eq!(records(&path), ["hello"]);
    }

    #[test]
    fn sweep_only_removes_old_files_with_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let old = SystemTime::now() - Duration::from_secs(10 * SECS_PER_DAY);
        let age = |name: &str, when: SystemTime| {
            let p = dir.path().join(name);
            fs::write(&p, "x").unwrap();
            filetime::set_file_mtime(&p, filetime::FileTime::from_system_time(when)).unwrap();
            p
        };

        let active = age("app.log", old);
        let expired = age("app.log.2020-01-01.001", old);
        let fresh = age("app.log.2020-01-02.001", SystemTime::now());
        let foreign = age("other.log.2020-01-01.001", old);
        let diag = MemoryDiagSink::new();

        let removed = sweep_expired(
            dir.path(),
            OsStr::new("app.log"),
            Duration::from_secs(7 * SECS_PER_DAY),
            SystemTime::now(),
            &diag,
        );

        assert_eq!(removed, 1);
        assert!(!expired.exists());
        assert!(active.exists());
        assert!(fresh.exists());
        assert!(foreign.exists());
        assert!(diag.take().is_empty());
    }

    #[test]
    fn sweep_of_missing_directory_reports_and_returns() {
        let dir = tempfile::tempdir().unwrap();
        let diag = MemoryDiagSink::new();

        let removed = sweep_expired(
            &dir.path().join("gone"),
            OsStr::new("app.log"),
            Duration::from_secs(SECS_PER_DAY),
            SystemTime::now(),
            &diag,
        );

        assert_eq!(removed, 0);
        assert_eq!(diag.take().len(), 1);
    }
}
