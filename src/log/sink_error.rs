use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors a sink can report back to the dispatcher.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Write attempted after `close`
    #[error("sink is closed")]
    SinkClosed,

    /// All 999 rotation slots for the day are taken
    #[error("rotate: no free sequence number left to rename {}", path.display())]
    RotationExhausted { path: PathBuf },

    /// I/O error when interacting with the filesystem or a stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
