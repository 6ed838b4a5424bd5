#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use fanlog::log::{
    AdapterRegistry, Dispatcher, DispatcherConfig, LogLevel, LogSink, SinkError, SinkKind,
    diag_sink::MemoryDiagSink,
};

/// In-memory sink shared between the test and the dispatcher.
#[derive(Default)]
pub struct Recorder {
    pub records: Mutex<Vec<(LogLevel, String)>>,
}

impl Recorder {
    pub fn texts(&self) -> Vec<String> {
        self.records.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

impl LogSink for Recorder {
    fn write(&self, text: &str, level: LogLevel) -> Result<(), SinkError> {
        self.records.lock().unwrap().push((level, text.to_owned()));
        Ok(())
    }
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
    fn close(&self) {}
}

pub fn register_recorder(registry: &mut AdapterRegistry, name: &str) -> Arc<Recorder> {
    let rec = Arc::new(Recorder::default());
    let shared = Arc::clone(&rec);
    registry.register(SinkKind::custom(name), move || {
        Ok(Arc::clone(&shared) as Arc<dyn LogSink>)
    });
    rec
}

pub fn dispatcher(registry: AdapterRegistry, config: DispatcherConfig) -> (Dispatcher, Arc<MemoryDiagSink>) {
    let diag = Arc::new(MemoryDiagSink::new());
    let d = Dispatcher::new(registry, config, diag.clone()).unwrap();
    (d, diag)
}

/// Lines of a log file with the `YYYY/MM/DD HH:MM:SS ` prefix removed.
pub fn records(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.get(20..).unwrap_or_default().to_owned())
        .collect()
}
