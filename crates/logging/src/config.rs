//! crates/logging/src/config.rs
//! Live configuration, partial updates and the merge rule between them.

use std::fmt;
use std::path::PathBuf;

use logging_sink::{ConsoleMirror, RotationPolicy};

use crate::error::ConfigError;
use crate::severity::Severity;

/// Bytes in one unit of [`Config::max_size_mb`].
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Default file name prefix.
pub const DEFAULT_PREFIX: &str = "zcgolog";

/// Default control listener port.
pub const DEFAULT_CONTROL_PORT: u16 = 9300;

/// Delivery mode of a logger.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Mode {
    /// Records are written synchronously by the calling thread.
    #[default]
    Local = 1,
    /// Records are queued and written by the drain loop.
    Server = 2,
}

impl Mode {
    /// Looks up a mode by its numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Local),
            2 => Some(Self::Server),
            _ => None,
        }
    }

    /// Numeric code of the mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "LOCAL",
            Self::Server => "SERVER",
        })
    }
}

/// What a producer does when the delivery queue is full.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum OverflowPolicy {
    /// Drop the record and print a notice to the console.
    #[default]
    Discard = 1,
    /// Wait for space.
    Block = 2,
}

impl OverflowPolicy {
    /// Looks up a policy by its numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Discard),
            2 => Some(Self::Block),
            _ => None,
        }
    }

    /// Numeric code of the policy.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discard => "DISCARD",
            Self::Block => "BLOCK",
        })
    }
}

/// Fully populated configuration of a logger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Directory for rotated files; `None` writes to the console only.
    pub dir: Option<PathBuf>,
    /// File name prefix.
    pub prefix: String,
    /// File size cap in mebibytes.
    pub max_size_mb: u64,
    /// Minimum severity for callers without an override.
    pub global_level: Severity,
    /// Delivery mode.
    pub mode: Mode,
    /// Capacity of the delivery queue.
    pub queue_capacity: usize,
    /// Behaviour of a full queue.
    pub overflow_policy: OverflowPolicy,
    /// Host the control listener binds; empty means all interfaces.
    pub control_host: String,
    /// Port the control listener binds.
    pub control_port: u16,
    /// Keep records out of the console while a file is open.
    pub suppress_console: bool,
    /// Run SERVER mode without the control listener.
    pub disable_control_listener: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: DEFAULT_PREFIX.to_owned(),
            max_size_mb: 2,
            global_level: Severity::Info,
            mode: Mode::Local,
            queue_capacity: 4096,
            overflow_policy: OverflowPolicy::Discard,
            control_host: String::new(),
            control_port: DEFAULT_CONTROL_PORT,
            suppress_console: false,
            disable_control_listener: false,
        }
    }
}

impl Config {
    /// Applies `update` on top of `self`.
    ///
    /// Unset, empty and zero fields leave the current value in place. The two
    /// flags only ever switch on.
    #[must_use]
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        let mut next = self.clone();
        if let Some(dir) = update.dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            next.dir = Some(dir.clone());
        }
        if let Some(prefix) = update.prefix.as_ref().filter(|p| !p.is_empty()) {
            next.prefix.clone_from(prefix);
        }
        if let Some(size) = update.max_size_mb.filter(|&s| s > 0) {
            next.max_size_mb = size;
        }
        if let Some(level) = update.global_level {
            next.global_level = level;
        }
        if let Some(mode) = update.mode {
            next.mode = mode;
        }
        if let Some(capacity) = update.queue_capacity.filter(|&c| c > 0) {
            next.queue_capacity = capacity;
        }
        if let Some(policy) = update.overflow_policy {
            next.overflow_policy = policy;
        }
        if let Some(host) = update.control_host.as_ref().filter(|h| !h.is_empty()) {
            next.control_host.clone_from(host);
        }
        if let Some(port) = update.control_port.filter(|&p| p > 0) {
            next.control_port = port;
        }
        if update.suppress_console == Some(true) {
            next.suppress_console = true;
        }
        if update.disable_control_listener == Some(true) {
            next.disable_control_listener = true;
        }
        next
    }

    /// Checks the values the merge rule cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size_mb == 0 {
            return Err(ConfigError::ZeroSizeCap);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }

    /// Size cap in bytes.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Rotation inputs derived from this configuration.
    #[must_use]
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            dir: self.dir.clone(),
            prefix: self.prefix.clone(),
            max_size_bytes: self.max_size_bytes(),
        }
    }

    /// Console mirroring derived from [`suppress_console`](Self::suppress_console).
    #[must_use]
    pub const fn console_mirror(&self) -> ConsoleMirror {
        ConsoleMirror::from_suppressed(self.suppress_console)
    }

    /// `host:port` the control listener binds.
    #[must_use]
    pub fn control_addr(&self) -> String {
        let host = if self.control_host.is_empty() {
            "0.0.0.0"
        } else {
            self.control_host.as_str()
        };
        format!("{host}:{}", self.control_port)
    }
}

/// Partial configuration passed to [`Logger::configure`](crate::Logger::configure).
///
/// Every field is optional. See [`Config::merged`] for how it is applied.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::config_file::RawConfigUpdate"))]
pub struct ConfigUpdate {
    /// See [`Config::dir`].
    pub dir: Option<PathBuf>,
    /// See [`Config::prefix`].
    pub prefix: Option<String>,
    /// See [`Config::max_size_mb`].
    pub max_size_mb: Option<u64>,
    /// See [`Config::global_level`].
    pub global_level: Option<Severity>,
    /// See [`Config::mode`].
    pub mode: Option<Mode>,
    /// See [`Config::queue_capacity`].
    pub queue_capacity: Option<usize>,
    /// See [`Config::overflow_policy`].
    pub overflow_policy: Option<OverflowPolicy>,
    /// See [`Config::control_host`].
    pub control_host: Option<String>,
    /// See [`Config::control_port`].
    pub control_port: Option<u16>,
    /// See [`Config::suppress_console`].
    pub suppress_console: Option<bool>,
    /// See [`Config::disable_control_listener`].
    pub disable_control_listener: Option<bool>,
}

impl ConfigUpdate {
    /// Update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets [`Config::dir`].
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Sets [`Config::prefix`].
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets [`Config::max_size_mb`].
    pub const fn max_size_mb(mut self, size: u64) -> Self {
        self.max_size_mb = Some(size);
        self
    }

    /// Sets [`Config::global_level`].
    pub const fn global_level(mut self, level: Severity) -> Self {
        self.global_level = Some(level);
        self
    }

    /// Sets [`Config::mode`].
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets [`Config::queue_capacity`].
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Sets [`Config::overflow_policy`].
    pub const fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = Some(policy);
        self
    }

    /// Sets [`Config::control_host`].
    pub fn control_host(mut self, host: impl Into<String>) -> Self {
        self.control_host = Some(host.into());
        self
    }

    /// Sets [`Config::control_port`].
    pub const fn control_port(mut self, port: u16) -> Self {
        self.control_port = Some(port);
        self
    }

    /// Sets [`Config::suppress_console`].
    pub const fn suppress_console(mut self, suppress: bool) -> Self {
        self.suppress_console = Some(suppress);
        self
    }

    /// Sets [`Config::disable_control_listener`].
    pub const fn disable_control_listener(mut self, disable: bool) -> Self {
        self.disable_control_listener = Some(disable);
        self
    }
}
