//! crates/logging/src/control/mod.rs
//! Level control requests and their plain-text responses.
//!
//! The request surface is a single `GET` on [`CONTROL_PATH`] with `logger`
//! and `level` query parameters. [`ControlQuery::apply`] does not depend on
//! a transport: the built-in listener decodes the query with axum, and
//! embedders with their own HTTP stack can call it directly.

#[cfg(feature = "control-server")]
pub(crate) mod server;

use std::fmt;

use crate::levels::LevelControl;
use crate::severity::Severity;

/// Path of the level control endpoint.
pub const CONTROL_PATH: &str = "/zcgolog/api/level/ctl";

/// Decoded query parameters of one control request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "control-server", derive(serde::Deserialize))]
pub struct ControlQuery {
    /// Caller identity the override applies to.
    pub logger: Option<String>,
    /// Severity code (1-6) or name.
    pub level: Option<String>,
}

impl ControlQuery {
    /// Query carrying both parameters.
    pub fn new(logger: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            logger: Some(logger.into()),
            level: Some(level.into()),
        }
    }

    /// Installs the requested override; nothing changes unless both parameters are valid.
    pub fn apply(&self, levels: &LevelControl) -> ControlResponse {
        match levels.apply_request(self.logger.as_deref(), self.level.as_deref()) {
            Ok((logger, level)) => ControlResponse::Applied { logger, level },
            Err(error) => ControlResponse::BadRequest(error.to_string()),
        }
    }
}

/// Result of serving one control request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ControlResponse {
    /// The override was installed.
    Applied {
        /// Caller identity the override applies to.
        logger: String,
        /// New minimum severity.
        level: Severity,
    },
    /// The request was malformed; nothing changed.
    BadRequest(String),
    /// The request used a method other than `GET`.
    MethodNotAllowed,
    /// The request targeted another path.
    NotFound,
}

impl ControlResponse {
    /// Numeric HTTP status.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Applied { .. } => 200,
            Self::BadRequest(_) => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }

    /// Plain-text response body.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::Applied { .. } => "ok".to_owned(),
            Self::BadRequest(reason) => format!("error: {reason}"),
            Self::NotFound => "error: not found".to_owned(),
            Self::MethodNotAllowed => "error: only GET is supported".to_owned(),
        }
    }
}

impl fmt::Display for ControlResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.body())
    }
}
