//! crates/logging-sink/src/rotation.rs
//! Daily, size-capped selection of the active log file.
//!
//! Files are named `{prefix}_{yyyyMMdd}_{sequence:05}.log`. The directory is
//! scanned on every decision rather than cached, so files created or removed
//! by other tools are picked up on the next rotation check.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::clock::DayStamp;
use crate::error::SinkError;

/// Highest sequence number allocated for a single day.
pub const MAX_DAILY_SEQUENCE: u32 = 99_999;

/// Extension shared by every rotated file.
pub const LOG_FILE_EXTENSION: &str = "log";

/// Inputs to a rotation decision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RotationPolicy {
    /// Directory holding the rotated files; `None` selects console-only output.
    pub dir: Option<PathBuf>,
    /// File name prefix.
    pub prefix: String,
    /// Size at which the newest file is considered full.
    pub max_size_bytes: u64,
}

impl RotationPolicy {
    /// Policy that never touches the filesystem.
    #[must_use]
    pub fn console_only() -> Self {
        Self {
            dir: None,
            prefix: String::new(),
            max_size_bytes: u64::MAX,
        }
    }

    /// Returns `true` when no directory is configured.
    #[must_use]
    pub fn is_console_only(&self) -> bool {
        self.dir.is_none()
    }
}

/// Outcome of [`resolve_active_file`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedTarget {
    /// No directory is configured; write to the console only.
    Console {
        /// Day the decision was made for.
        day: DayStamp,
    },
    /// Append to the file at `path`.
    File {
        /// Path of the file to append to. The file exists.
        path: PathBuf,
        /// Day the file belongs to.
        day: DayStamp,
    },
}

impl ResolvedTarget {
    /// Day the decision was made for.
    #[must_use]
    pub fn day(&self) -> &DayStamp {
        match self {
            Self::Console { day } | Self::File { day, .. } => day,
        }
    }
}

/// Picks the file that the next record should be appended to, for today.
pub fn resolve_active_file(policy: &RotationPolicy) -> Result<ResolvedTarget, SinkError> {
    resolve_active_file_for_day(policy, &DayStamp::today())
}

/// Picks the file that the next record should be appended to, for `day`.
///
/// Reuses the highest-numbered file of the day while it is smaller than the
/// cap. Otherwise allocates the next sequence number and creates an empty
/// file with that name.
pub fn resolve_active_file_for_day(
    policy: &RotationPolicy,
    day: &DayStamp,
) -> Result<ResolvedTarget, SinkError> {
    let Some(dir) = policy.dir.as_deref() else {
        return Ok(ResolvedTarget::Console { day: day.clone() });
    };
    if policy.max_size_bytes == 0 {
        return Err(SinkError::InvalidSizeCap);
    }

    let newest = newest_sequence(dir, &policy.prefix, day)?;
    if let Some(sequence) = newest {
        let path = dir.join(file_name(&policy.prefix, day, sequence));
        let size = fs::metadata(&path)
            .map_err(|source| SinkError::Stat {
                path: path.clone(),
                source,
            })?
            .len();
        if size < policy.max_size_bytes {
            return Ok(ResolvedTarget::File {
                path,
                day: day.clone(),
            });
        }
    }

    let sequence = next_sequence(newest, day)?;
    let path = dir.join(file_name(&policy.prefix, day, sequence));
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|source| SinkError::Create {
            path: path.clone(),
            source,
        })?;
    tracing::debug!(target: "zclog::rotation", path = %path.display(), "allocated log file");

    Ok(ResolvedTarget::File {
        path,
        day: day.clone(),
    })
}

/// Renders the file name for `sequence` on `day`.
#[must_use]
pub fn file_name(prefix: &str, day: &DayStamp, sequence: u32) -> String {
    format!("{prefix}_{day}_{sequence:05}.{LOG_FILE_EXTENSION}")
}

/// Extracts the sequence number from `name` when it belongs to `prefix` and `day`.
#[must_use]
pub fn parse_sequence(name: &str, prefix: &str, day: &DayStamp) -> Option<u32> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('_')?;
    let rest = rest.strip_prefix(day.as_str())?.strip_prefix('_')?;
    let digits = rest.strip_suffix(LOG_FILE_EXTENSION)?.strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn newest_sequence(dir: &Path, prefix: &str, day: &DayStamp) -> Result<Option<u32>, SinkError> {
    let entries = fs::read_dir(dir).map_err(|source| SinkError::ListDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut newest = None;
    for entry in entries {
        let entry = entry.map_err(|source| SinkError::ListDir {
            dir: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(sequence) = parse_sequence(name, prefix, day) {
            newest = newest.max(Some(sequence));
        }
    }
    Ok(newest)
}

fn next_sequence(newest: Option<u32>, day: &DayStamp) -> Result<u32, SinkError> {
    let next = newest.map_or(1, |n| n.saturating_add(1));
    if next > MAX_DAILY_SEQUENCE {
        return Err(SinkError::SequenceExhausted {
            day: day.to_string(),
        });
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DayStamp {
        DayStamp::parse("20240307").unwrap()
    }

    #[test]
    fn file_name_pads_sequence() {
        assert_eq!(file_name("app", &day(), 7), "app_20240307_00007.log");
        assert_eq!(file_name("app", &day(), 99_999), "app_20240307_99999.log");
    }

    #[test]
    fn parse_sequence_requires_matching_prefix_and_day() {
        let day = day();
        assert_eq!(parse_sequence("app_20240307_00012.log", "app", &day), Some(12));
        assert_eq!(parse_sequence("app_20240306_00012.log", "app", &day), None);
        assert_eq!(parse_sequence("other_20240307_00012.log", "app", &day), None);
        assert_eq!(parse_sequence("app_20240307_00012.txt", "app", &day), None);
        assert_eq!(parse_sequence("app_20240307_.log", "app", &day), None);
        assert_eq!(parse_sequence("app_20240307_0x12.log", "app", &day), None);
    }

    #[test]
    fn prefix_containing_underscores_is_supported() {
        let day = day();
        let name = file_name("my_app", &day, 3);
        assert_eq!(parse_sequence(&name, "my_app", &day), Some(3));
    }

    #[test]
    fn next_sequence_starts_at_one() {
        assert_eq!(next_sequence(None, &day()).unwrap(), 1);
        assert_eq!(next_sequence(Some(41), &day()).unwrap(), 42);
    }

    #[test]
    fn next_sequence_stops_at_daily_limit() {
        assert_eq!(next_sequence(Some(99_998), &day()).unwrap(), 99_999);
        assert!(matches!(
            next_sequence(Some(99_999), &day()),
            Err(SinkError::SequenceExhausted { .. })
        ));
    }

    #[test]
    fn console_policy_resolves_without_touching_disk() {
        let resolved = resolve_active_file_for_day(&RotationPolicy::console_only(), &day()).unwrap();
        assert_eq!(resolved, ResolvedTarget::Console { day: day() });
    }
}
