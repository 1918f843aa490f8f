//! crates/logging-sink/src/active_file.rs

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::clock::DayStamp;
use crate::error::SinkError;

/// Open handle on the file currently receiving records.
///
/// Tracks the number of bytes in the file so rotation checks do not need a
/// `stat` per record. The counter starts from the on-disk size at open time.
#[derive(Debug)]
pub struct ActiveFile {
    file: File,
    path: PathBuf,
    day: DayStamp,
    size: u64,
}

impl ActiveFile {
    /// Opens `path` for appending; the file must already exist.
    pub fn open(path: &Path, day: DayStamp) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let size = file
            .metadata()
            .map_err(|source| SinkError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            day,
            size,
        })
    }

    /// Path of the open file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Day the file belongs to.
    #[must_use]
    pub fn day(&self) -> &DayStamp {
        &self.day
    }

    /// Bytes written so far, including content present before opening.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether the next record belongs in a different file.
    #[must_use]
    pub fn needs_rotation(&self, today: &DayStamp, max_size_bytes: u64) -> bool {
        self.day != *today || self.size >= max_size_bytes
    }

    /// Appends `bytes` in full.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.size = self.size.saturating_add(bytes.len() as u64);
        Ok(())
    }

    /// Flushes and closes the file.
    pub fn close(mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn day(text: &str) -> DayStamp {
        DayStamp::parse(text).unwrap()
    }

    #[test]
    fn size_starts_from_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_20240307_00001.log");
        fs::write(&path, b"0123456789").unwrap();

        let mut file = ActiveFile::open(&path, day("20240307")).unwrap();
        assert_eq!(file.size(), 10);

        file.append(b"abc\n").unwrap();
        assert_eq!(file.size(), 14);
        file.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"0123456789abc\n");
    }

    #[test]
    fn rotation_triggers_on_size_or_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_20240307_00001.log");
        fs::write(&path, b"").unwrap();

        let mut file = ActiveFile::open(&path, day("20240307")).unwrap();
        assert!(!file.needs_rotation(&day("20240307"), 8));
        assert!(file.needs_rotation(&day("20240308"), 8));

        file.append(b"12345678").unwrap();
        assert!(file.needs_rotation(&day("20240307"), 8));
    }

    #[test]
    fn open_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.log");
        assert!(matches!(
            ActiveFile::open(&missing, day("20240307")),
            Err(SinkError::Open { .. })
        ));
    }
}
