//! crates/logging/src/severity.rs
//! Ordered record severities and their wire codes.

use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;

/// Severity of a record, ordered from least to most severe.
///
/// The discriminants are the codes accepted by the level control request.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[repr(u8)]
pub enum Severity {
    /// Developer diagnostics.
    Debug = 1,
    /// Routine operational messages.
    #[default]
    Info = 2,
    /// Something unexpected that does not stop the caller.
    Warning = 3,
    /// A failed operation.
    Error = 4,
    /// Written synchronously, then unwinds the calling thread.
    Panic = 5,
    /// Written synchronously, then terminates the process.
    Fatal = 6,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Panic,
        Self::Fatal,
    ];

    /// Looks up a severity by its numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Debug),
            2 => Some(Self::Info),
            3 => Some(Self::Warning),
            4 => Some(Self::Error),
            5 => Some(Self::Panic),
            6 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Numeric code of the severity.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in formatted lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
        }
    }

    /// Whether logging at this severity ends the caller's control flow.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Panic | Self::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ControlError;

    /// Accepts a numeric code or a case-insensitive name (`warn` is an alias).
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| ControlError::InvalidLevel(text.to_owned()));
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "PANIC" => Ok(Self::Panic),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(ControlError::InvalidLevel(text.to_owned())),
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = ControlError;

    fn try_from(code: u8) -> Result<Self, ControlError> {
        Self::from_code(code).ok_or_else(|| ControlError::InvalidLevel(code.to_string()))
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.code()
    }
}
