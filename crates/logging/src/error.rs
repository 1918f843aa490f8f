//! crates/logging/src/error.rs
//! Error types surfaced by configuration, control requests and lifecycle operations.

use std::io;
use std::time::Duration;

use logging_sink::SinkError;
use thiserror::Error;

/// A configuration value that cannot be applied.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    /// The maximum file size resolved to zero bytes.
    #[error("maximum log file size must be greater than zero")]
    ZeroSizeCap,
    /// The queue capacity resolved to zero.
    #[error("queue capacity must be greater than zero")]
    ZeroQueueCapacity,
    /// The file name prefix is empty.
    #[error("log file name prefix must not be empty")]
    EmptyPrefix,
    /// A numeric field holds a code with no matching variant.
    #[error("unknown {field} code {code}")]
    UnknownCode {
        /// Name of the offending field.
        field: &'static str,
        /// Code that was supplied.
        code: u8,
    },
    /// The control port is not a number between 0 and 65535.
    #[error("invalid control port {0:?}")]
    InvalidPort(String),
    /// A configuration file could not be read.
    #[cfg(feature = "serde")]
    #[error("failed to read configuration file {path}: {message}")]
    Read {
        /// File that was being read.
        path: String,
        /// Rendered I/O failure.
        message: String,
    },
    /// A configuration document is not valid JSON for [`ConfigUpdate`](crate::ConfigUpdate).
    #[cfg(feature = "serde")]
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

/// A level control request that cannot be applied.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ControlError {
    /// The request names no logger.
    #[error("missing logger name")]
    MissingLogger,
    /// The request carries no level.
    #[error("missing level")]
    MissingLevel,
    /// The level is neither a known name nor a code from 1 to 6.
    #[error("invalid level {0:?}")]
    InvalidLevel(String),
}

/// Errors returned by [`Logger`](crate::Logger) lifecycle operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// The merged configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The output file could not be selected or opened.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// A control request was rejected.
    #[error(transparent)]
    Control(#[from] ControlError),
    /// The drain loop did not confirm shutdown in time.
    #[error("drain loop did not stop within {0:?}")]
    DrainStopTimeout(Duration),
    /// A previous drain loop still holds the exclusive guard.
    #[error("a drain loop is already running")]
    DrainAlreadyRunning,
    /// The drain loop thread could not be spawned.
    #[error("failed to spawn drain loop thread: {0}")]
    SpawnDrain(#[source] io::Error),
    /// The control listener could not be started.
    #[error("failed to start level control listener on {addr}: {source}")]
    ControlListener {
        /// Address the listener tried to bind.
        addr: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}
