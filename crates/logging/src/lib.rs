#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging/src/lib.rs
//!
//! # Overview
//!
//! `logging` is the in-process half of zclog. Application code submits
//! [`Record`]s through a [`Logger`]; the logger filters them by severity,
//! then either writes them on the calling thread (LOCAL mode) or hands them
//! to a background drain loop through a bounded queue (SERVER mode). File
//! selection, rotation and console mirroring live in `logging-sink`.
//!
//! # Design
//!
//! - [`Severity`] and [`Record`] form the record model. A record carries its
//!   caller, a `{}` template and its rendered arguments, and formats to one
//!   line: `[LEVEL] time:<ts> code:<file> <line> func:<caller> <message>`.
//! - [`LevelControl`] holds the global minimum severity and per-caller
//!   overrides. A [`ControlQuery`] carries the parameters of one `GET` on
//!   [`CONTROL_PATH`]; with the `control-server` feature an axum listener
//!   serves that endpoint while the logger is in SERVER mode.
//! - [`DeliveryQueue`] is the bounded hand-off to the drain loop. When it is
//!   full, [`OverflowPolicy::Discard`] drops the record with a notice on
//!   standard error and [`OverflowPolicy::Block`] waits for space.
//! - [`Logger::configure`] merges a [`ConfigUpdate`] into the live
//!   [`Config`] and performs the mode transition, restarting the drain loop
//!   in SERVER mode without losing queued records.
//! - With the `tracing-bridge` feature, `ZclogLayer` forwards events from
//!   the `tracing` ecosystem into a logger.
//!
//! # Invariants
//!
//! - Records from one producer reach the output in submission order.
//! - At most one drain loop writes to the output at any time.
//! - PANIC and FATAL records bypass the filter and the queue and are written
//!   before control leaves the logging call.
//!
//! # Errors
//!
//! Configuration and startup failures surface as [`LogError`]. Failures
//! while running, such as a rotation that cannot create a file, degrade
//! output to the console and are reported there and through `tracing`.
//!
//! # Examples
//!
//! ```
//! use logging::{ConfigUpdate, Logger, Mode, Severity};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = Logger::new();
//! logger
//!     .configure(
//!         ConfigUpdate::new()
//!             .dir(dir.path())
//!             .mode(Mode::Server)
//!             .global_level(Severity::Debug)
//!             .suppress_console(true)
//!             .disable_control_listener(true),
//!     )
//!     .unwrap();
//!
//! logging::debug!(logger, "cache warmed in {} ms", 12);
//! logger.shutdown().unwrap();
//!
//! let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
//! assert_eq!(files.len(), 1);
//! ```

mod config;
#[cfg(feature = "serde")]
mod config_file;
pub mod control;
mod controller;
mod drain;
mod error;
mod levels;
mod macros;
mod queue;
mod record;
mod severity;
mod stats;
#[cfg(feature = "tracing-bridge")]
mod tracing_bridge;

pub use config::{BYTES_PER_MB, Config, ConfigUpdate, DEFAULT_CONTROL_PORT, DEFAULT_PREFIX, Mode, OverflowPolicy};
pub use control::{CONTROL_PATH, ControlQuery, ControlResponse};
pub use controller::{DEFAULT_STOP_TIMEOUT, FatalHandler, Logger, LoggerBuilder};
pub use error::{ConfigError, ControlError, LogError};
pub use levels::LevelControl;
pub use logging_sink::{Console, ConsoleMirror};
pub use queue::{Admission, BLOCK_TICK, DeliveryQueue, drop_notice};
pub use record::{Caller, Record, render_message};
pub use severity::Severity;
pub use stats::StatsSnapshot;
#[cfg(feature = "tracing-bridge")]
pub use tracing_bridge::ZclogLayer;
