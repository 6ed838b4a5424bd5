use std::io;

use thiserror::Error;

use crate::log::{sink_error::SinkError, sink_kind::SinkKind};

/// Errors surfaced to callers of the dispatcher and the registry.
#[derive(Error, Debug)]
pub enum LogError {
    /// No constructor is registered for this kind
    #[error("unknown sink kind: {0}")]
    UnknownSinkKind(SinkKind),

    /// Removal requested for a kind that has no live sink
    #[error("sink not registered: {0}")]
    SinkNotRegistered(SinkKind),

    /// The constructor ran but could not build the sink
    #[error("failed to construct {kind} sink: {source}")]
    SinkConstruction {
        kind: SinkKind,
        #[source]
        source: SinkError,
    },

    /// The delivery loop has stopped; nothing can be enqueued
    #[error("dispatcher is closed")]
    DispatcherClosed,

    #[error("failed to spawn dispatcher thread: {0}")]
    WorkerSpawn(#[source] io::Error),
}
