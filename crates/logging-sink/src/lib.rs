#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` owns everything below the formatted log line: choosing the
//! file a line goes to, rotating that file by day and size, and mirroring
//! lines to the console. The `logging` crate decides *what* to write; this
//! crate decides *where*.
//!
//! # Design
//!
//! [`resolve_active_file`] implements the rotation decision. It scans the
//! configured directory for `{prefix}_{yyyyMMdd}_{NNNNN}.log` files, reuses
//! the newest one while it is below the size cap and otherwise creates the
//! next sequence number. [`OutputTarget`] wraps the resulting
//! [`ActiveFile`] together with a shared [`Console`] and a
//! [`ConsoleMirror`] setting, and re-runs the decision whenever the day
//! changes or the cap is reached.
//!
//! # Invariants
//!
//! - At most [`MAX_DAILY_SEQUENCE`] files are allocated per prefix and day.
//! - The size check is closed (`size >= cap` rotates) and happens before a
//!   write, so a file exceeds the cap by at most one line.
//! - An [`OutputTarget`] without an open file writes to the console.
//!
//! # Errors
//!
//! Filesystem failures surface as [`SinkError`]. Write failures on an open
//! target surface as [`std::io::Error`] after the line has been sent to the
//! console.
//!
//! # Examples
//!
//! ```
//! use logging_sink::{Console, ConsoleMirror, OutputTarget, RotationPolicy};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let policy = RotationPolicy {
//!     dir: Some(dir.path().to_path_buf()),
//!     prefix: "svc".to_owned(),
//!     max_size_bytes: 1024,
//! };
//!
//! let mut target = OutputTarget::console_only(Console::from_writer(Vec::new()));
//! target.reopen(policy, ConsoleMirror::FileOnly).unwrap();
//! target.write_line("[INFO] started").unwrap();
//! assert!(target.file().unwrap().size() > 0);
//! ```

mod active_file;
mod clock;
mod console;
mod error;
mod mirror;
mod rotation;
mod target;

pub use active_file::ActiveFile;
pub use clock::{DayStamp, TIMESTAMP_FORMAT, format_timestamp, now};
pub use console::Console;
pub use error::SinkError;
pub use mirror::ConsoleMirror;
pub use rotation::{
    LOG_FILE_EXTENSION, MAX_DAILY_SEQUENCE, ResolvedTarget, RotationPolicy, file_name,
    parse_sequence, resolve_active_file, resolve_active_file_for_day,
};
pub use target::OutputTarget;
