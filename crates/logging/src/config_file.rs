//! crates/logging/src/config_file.rs
//! JSON configuration documents.
//!
//! Field names and numeric codes follow the established zcgolog
//! configuration files, so an existing `log_mod: 2` document keeps working.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{ConfigUpdate, Mode, OverflowPolicy};
use crate::error::ConfigError;
use crate::severity::Severity;

/// Control port given either as a number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPort {
    Number(u16),
    Text(String),
}

/// On-disk shape of a [`ConfigUpdate`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawConfigUpdate {
    log_forbid_stdout: Option<bool>,
    log_file_dir: Option<String>,
    log_file_name_prefix: Option<String>,
    log_file_max_size_m: Option<u64>,
    log_level_global: Option<u8>,
    log_line_format: Option<String>,
    log_mod: Option<u8>,
    log_channel_cap: Option<usize>,
    log_chn_over_policy: Option<u8>,
    log_level_ctl_host: Option<String>,
    log_level_ctl_port: Option<RawPort>,
    log_level_ctl_disabled: Option<bool>,
}

/// Treats zero as "not set" and rejects codes without a variant.
fn decode<T>(
    code: Option<u8>,
    field: &'static str,
    lookup: fn(u8) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    match code {
        None | Some(0) => Ok(None),
        Some(code) => lookup(code)
            .map(Some)
            .ok_or(ConfigError::UnknownCode { field, code }),
    }
}

impl TryFrom<RawConfigUpdate> for ConfigUpdate {
    type Error = ConfigError;

    fn try_from(raw: RawConfigUpdate) -> Result<Self, Self::Error> {
        // The line layout is fixed; the key is accepted for compatibility only.
        let _ = raw.log_line_format;

        let control_port = match raw.log_level_ctl_port {
            None => None,
            Some(RawPort::Number(port)) => Some(port),
            Some(RawPort::Text(text)) if text.trim().is_empty() => None,
            Some(RawPort::Text(text)) => Some(
                text.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(text.clone()))?,
            ),
        };

        Ok(Self {
            dir: raw.log_file_dir.map(PathBuf::from),
            prefix: raw.log_file_name_prefix,
            max_size_mb: raw.log_file_max_size_m,
            global_level: decode(raw.log_level_global, "log_level_global", Severity::from_code)?,
            mode: decode(raw.log_mod, "log_mod", Mode::from_code)?,
            queue_capacity: raw.log_channel_cap,
            overflow_policy: decode(
                raw.log_chn_over_policy,
                "log_chn_over_policy",
                OverflowPolicy::from_code,
            )?,
            control_host: raw.log_level_ctl_host,
            control_port,
            suppress_console: raw.log_forbid_stdout,
            disable_control_listener: raw.log_level_ctl_disabled,
        })
    }
}

impl ConfigUpdate {
    /// Parses a JSON configuration document.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging::{ConfigUpdate, Mode};
    ///
    /// let update = ConfigUpdate::from_json_str(r#"{ "log_mod": 2, "log_channel_cap": 64 }"#).unwrap();
    /// assert_eq!(update.mode, Some(Mode::Server));
    /// assert_eq!(update.queue_capacity, Some(64));
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_maps_every_field() {
        let update = ConfigUpdate::from_json_str(
            r#"{
                "log_forbid_stdout": true,
                "log_file_dir": "/var/log/svc",
                "log_file_name_prefix": "svc",
                "log_file_max_size_m": 16,
                "log_level_global": 1,
                "log_line_format": "%level %msg",
                "log_mod": 2,
                "log_channel_cap": 128,
                "log_chn_over_policy": 2,
                "log_level_ctl_host": "127.0.0.1",
                "log_level_ctl_port": "9400"
            }"#,
        )
        .unwrap();

        assert_eq!(update.suppress_console, Some(true));
        assert_eq!(update.dir, Some(PathBuf::from("/var/log/svc")));
        assert_eq!(update.prefix.as_deref(), Some("svc"));
        assert_eq!(update.max_size_mb, Some(16));
        assert_eq!(update.global_level, Some(Severity::Debug));
        assert_eq!(update.mode, Some(Mode::Server));
        assert_eq!(update.queue_capacity, Some(128));
        assert_eq!(update.overflow_policy, Some(OverflowPolicy::Block));
        assert_eq!(update.control_host.as_deref(), Some("127.0.0.1"));
        assert_eq!(update.control_port, Some(9400));
    }

    #[test]
    fn zero_codes_mean_unset() {
        let update =
            ConfigUpdate::from_json_str(r#"{ "log_mod": 0, "log_level_global": 0, "log_level_ctl_port": "" }"#)
                .unwrap();
        assert_eq!(update, ConfigUpdate::new());
    }

    #[test]
    fn numeric_port_is_accepted() {
        let update = ConfigUpdate::from_json_str(r#"{ "log_level_ctl_port": 9500 }"#).unwrap();
        assert_eq!(update.control_port, Some(9500));
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let error = ConfigUpdate::from_json_str(r#"{ "log_chn_over_policy": 7 }"#).unwrap_err();
        assert!(error.to_string().contains("log_chn_over_policy"), "{error}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ConfigUpdate::from_json_str(r#"{ "log_colour": true }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let error = ConfigUpdate::from_json_file(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
