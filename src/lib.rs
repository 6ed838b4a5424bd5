//! fanlog is an asynchronous, leveled logging dispatcher.
//!
//! Application threads submit records to a [`log::Dispatcher`], which filters
//! them by level, attaches caller context to high-severity records and queues
//! them for a single delivery thread. That thread fans every record out to the
//! registered sinks: a coloured console sink, a rotating file sink, or anything
//! registered in an [`log::AdapterRegistry`].

/// INI configuration loading and typed logging settings.
pub mod config;
/// Dispatcher, sinks and their supporting types.
pub mod log;
