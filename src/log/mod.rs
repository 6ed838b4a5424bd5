pub mod adapter_registry;
pub mod caller_context;
pub mod clock;
pub mod console_sink;
pub mod diag_sink;
pub mod dispatcher;
pub mod file_sink;
pub mod log_envelope;
pub mod log_error;
pub mod log_level;
pub mod log_macros;
pub mod log_sink;
pub mod sink_error;
pub mod sink_kind;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use adapter_registry::AdapterRegistry;
pub use console_sink::ConsoleSink;
pub use diag_sink::{DiagSink, NoopDiagSink, StderrDiagSink};
pub use dispatcher::{Dispatcher, DispatcherConfig, OverflowPolicy};
pub use file_sink::{FileSinkConfig, RotatingFileSink};
pub use log_envelope::LogEnvelope;
pub use log_error::LogError;
pub use log_level::LogLevel;
pub use log_sink::LogSink;
pub use sink_error::SinkError;
pub use sink_kind::SinkKind;

/// A panic on another thread must not silence logging.
pub(crate) fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
