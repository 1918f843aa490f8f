//! crates/logging-sink/src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::rotation::MAX_DAILY_SEQUENCE;

/// Failures raised while resolving or opening the active output file.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The log directory could not be listed.
    #[error("failed to list log directory {dir}: {source}")]
    ListDir {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Metadata for the newest log file could not be read.
    #[error("failed to stat log file {path}: {source}")]
    Stat {
        /// File whose size was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A fresh sequence file could not be created.
    #[error("failed to create log file {path}: {source}")]
    Create {
        /// File that was being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The resolved file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    Open {
        /// File that was being opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Every sequence number for the day is already taken.
    #[error("log files for {day} exceed the daily limit of {MAX_DAILY_SEQUENCE}")]
    SequenceExhausted {
        /// Day whose sequence space is exhausted.
        day: String,
    },
    /// The size cap must be at least one byte.
    #[error("log file size cap must be greater than zero")]
    InvalidSizeCap,
}
