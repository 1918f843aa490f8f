//! crates/logging/src/levels.rs
//! Global minimum severity and per-caller overrides.

use std::sync::atomic::{AtomicU8, Ordering};

use dashmap::DashMap;

use crate::error::ControlError;
use crate::severity::Severity;

/// Filter consulted by every call site before a record is built.
///
/// Reads never block: the global level is an atomic and the override map is
/// sharded. Overrides are additive and never expire.
#[derive(Debug)]
pub struct LevelControl {
    global: AtomicU8,
    overrides: DashMap<String, Severity>,
}

impl LevelControl {
    /// Filter with `global` as the minimum and no overrides.
    #[must_use]
    pub fn new(global: Severity) -> Self {
        Self {
            global: AtomicU8::new(global.code()),
            overrides: DashMap::new(),
        }
    }

    /// Minimum severity for callers without an override.
    #[must_use]
    pub fn global(&self) -> Severity {
        Severity::from_code(self.global.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Replaces the global minimum.
    pub fn set_global(&self, level: Severity) {
        self.global.store(level.code(), Ordering::Release);
    }

    /// Installs or replaces the override for `logger`, returning the previous one.
    pub fn set_override(
        &self,
        logger: impl Into<String>,
        level: Severity,
    ) -> Result<Option<Severity>, ControlError> {
        let logger = logger.into();
        if logger.is_empty() {
            return Err(ControlError::MissingLogger);
        }
        Ok(self.overrides.insert(logger, level))
    }

    /// Override installed for exactly `logger`.
    #[must_use]
    pub fn override_for(&self, logger: &str) -> Option<Severity> {
        self.overrides.get(logger).map(|entry| *entry.value())
    }

    /// Snapshot of every override, sorted by logger name.
    #[must_use]
    pub fn overrides(&self) -> Vec<(String, Severity)> {
        let mut entries: Vec<_> = self
            .overrides
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort();
        entries
    }

    /// Minimum severity that applies to records from `function`.
    #[must_use]
    pub fn effective(&self, function: &str) -> Severity {
        self.override_for(function).unwrap_or_else(|| self.global())
    }

    /// Whether a record at `severity` from `function` passes the filter.
    ///
    /// Terminal severities always pass.
    #[must_use]
    pub fn enabled(&self, severity: Severity, function: &str) -> bool {
        severity.is_terminal() || severity >= self.effective(function)
    }

    /// Validates and applies a control request.
    ///
    /// Nothing is changed unless both parameters are valid.
    pub fn apply_request(
        &self,
        logger: Option<&str>,
        level: Option<&str>,
    ) -> Result<(String, Severity), ControlError> {
        let logger = logger
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ControlError::MissingLogger)?;
        let level = level
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(ControlError::MissingLevel)?;
        let code: u8 = level
            .parse()
            .map_err(|_| ControlError::InvalidLevel(level.to_owned()))?;
        let severity = Severity::try_from(code)?;

        let previous = self.set_override(logger, severity)?;
        tracing::info!(
            target: "zclog::control",
            logger,
            level = %severity,
            previous = ?previous,
            "installed level override"
        );
        Ok((logger.to_owned(), severity))
    }
}

impl Default for LevelControl {
    fn default() -> Self {
        Self::new(Severity::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_takes_precedence_over_global() {
        let levels = LevelControl::new(Severity::Info);
        levels.set_override("app::x", Severity::Debug).unwrap();

        assert!(levels.enabled(Severity::Debug, "app::x"));
        assert!(!levels.enabled(Severity::Debug, "app::y"));
        assert!(levels.enabled(Severity::Info, "app::y"));
    }

    #[test]
    fn override_can_raise_the_bar() {
        let levels = LevelControl::new(Severity::Debug);
        levels.set_override("noisy", Severity::Error).unwrap();

        assert!(!levels.enabled(Severity::Warning, "noisy"));
        assert!(levels.enabled(Severity::Warning, "quiet"));
    }

    #[test]
    fn terminal_severities_bypass_the_filter() {
        let levels = LevelControl::new(Severity::Fatal);
        levels.set_override("x", Severity::Fatal).unwrap();
        assert!(levels.enabled(Severity::Panic, "x"));
        assert!(levels.enabled(Severity::Fatal, "y"));
        assert!(!levels.enabled(Severity::Error, "y"));
    }

    #[test]
    fn request_installs_override() {
        let levels = LevelControl::default();
        let applied = levels.apply_request(Some("svc::db"), Some("1")).unwrap();

        assert_eq!(applied, ("svc::db".to_owned(), Severity::Debug));
        assert_eq!(levels.override_for("svc::db"), Some(Severity::Debug));
    }

    #[test]
    fn invalid_requests_leave_the_map_untouched() {
        let levels = LevelControl::default();
        levels.set_override("kept", Severity::Warning).unwrap();

        assert_eq!(
            levels.apply_request(None, Some("1")),
            Err(ControlError::MissingLogger)
        );
        assert_eq!(
            levels.apply_request(Some("  "), Some("1")),
            Err(ControlError::MissingLogger)
        );
        assert_eq!(
            levels.apply_request(Some("kept"), None),
            Err(ControlError::MissingLevel)
        );
        assert_eq!(
            levels.apply_request(Some("kept"), Some("7")),
            Err(ControlError::InvalidLevel("7".to_owned()))
        );
        assert_eq!(
            levels.apply_request(Some("kept"), Some("debug")),
            Err(ControlError::InvalidLevel("debug".to_owned()))
        );

        assert_eq!(levels.overrides(), vec![("kept".to_owned(), Severity::Warning)]);
    }

    #[test]
    fn global_level_is_replaceable() {
        let levels = LevelControl::new(Severity::Info);
        levels.set_global(Severity::Error);
        assert_eq!(levels.global(), Severity::Error);
        assert_eq!(levels.effective("anyone"), Severity::Error);
    }
}
