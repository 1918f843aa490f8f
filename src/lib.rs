#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # zclog
//!
//! Embedded logging with synchronous (LOCAL) and queued (SERVER) delivery,
//! daily size-capped file rotation and a runtime level control endpoint.
//!
//! This crate re-exports the `logging` crate, which owns the record model,
//! the delivery queue and the mode controller, and exposes the file layer as
//! [`sink`].
//!
//! ```
//! use zclog::{Caller, ConfigUpdate, Logger, Severity};
//!
//! let logger = Logger::new();
//! logger.configure(ConfigUpdate::new().global_level(Severity::Warning)).unwrap();
//! zclog::warn!(logger, "queue depth {} above {}", 900, 800);
//! logger.log(
//!     Severity::Error,
//!     Caller::new("main.rs", 1, "app"),
//!     "giving up after {} retries",
//!     vec!["3".to_owned()],
//! );
//! ```

pub use logging::*;

/// File selection, rotation and console output.
pub use logging_sink as sink;
