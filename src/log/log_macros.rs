//! Simple, leveled logging macros for `Dispatcher` and `DiagSink`.
//!
//! # Feature Flags
//! specific log levels are controlled by cargo features:
//! `log-trace`, `log-debug`, `log-info`, `log-warn`, `log-error`.
//!
//! If a feature is disabled, the corresponding dispatcher macros expand to
//! `()`, removing all formatting and allocation overhead at compile time.
//! `log_fatal!` and the `diag_*` macros are never compiled out.

// ============================================================================
// 1. GENERIC INTERNAL MACROS (The "Workers")
// ============================================================================

#[macro_export]
macro_rules! diag_log {
    ($sink:expr, $lvl:expr, $($arg:tt)*) => {{
        let __msg = format!($($arg)*);
        $crate::log::diag_sink::DiagSink::report(&*$sink, $lvl, &__msg, module_path!());
    }};
}

#[macro_export]
macro_rules! diag_warn  { ($sink:expr, $($arg:tt)*) => { $crate::diag_log!($sink, $crate::log::log_level::LogLevel::Warn, $($arg)*) } }
#[macro_export]
macro_rules! diag_error { ($sink:expr, $($arg:tt)*) => { $crate::diag_log!($sink, $crate::log::log_level::LogLevel::Error, $($arg)*) } }

// ============================================================================
// 2. LEVEL-SPECIFIC MACROS (Feature Gated)
// ============================================================================

// ---------------------- TRACE ----------------------
#[cfg(feature = "log-trace")]
#[macro_export]
macro_rules! log_trace { ($d:expr, $($arg:tt)*) => { $d.trace(format_args!($($arg)*)) } }

#[cfg(not(feature = "log-trace"))]
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- DEBUG ----------------------
#[cfg(feature = "log-debug")]
#[macro_export]
macro_rules! log_debug { ($d:expr, $($arg:tt)*) => { $d.debug(format_args!($($arg)*)) } }

#[cfg(not(feature = "log-debug"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- INFO ----------------------
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! log_info { ($d:expr, $($arg:tt)*) => { $d.info(format_args!($($arg)*)) } }

#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- WARN ----------------------
#[cfg(feature = "log-warn")]
#[macro_export]
macro_rules! log_warn { ($d:expr, $($arg:tt)*) => { $d.warn(format_args!($($arg)*)) } }

#[cfg(not(feature = "log-warn"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- ERROR / CRITICAL ----------------------
// The call site of the macro is what ends up in the caller context.
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! log_error { ($d:expr, $($arg:tt)*) => { $d.error(0, format_args!($($arg)*)) } }
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! log_critical { ($d:expr, $($arg:tt)*) => { $d.critical(0, format_args!($($arg)*)) } }

#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ()
    };
}
#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- FATAL ----------------------
#[macro_export]
macro_rules! log_fatal { ($d:expr, $($arg:tt)*) => { $d.fatal(0, format_args!($($arg)*)) } }
