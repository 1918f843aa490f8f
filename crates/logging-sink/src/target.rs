//! crates/logging-sink/src/target.rs
//! Destination for formatted lines: the active file, the console, or both.

use std::io;

use crate::active_file::ActiveFile;
use crate::clock::DayStamp;
use crate::console::Console;
use crate::error::SinkError;
use crate::mirror::ConsoleMirror;
use crate::rotation::{ResolvedTarget, RotationPolicy, resolve_active_file_for_day};

/// Current write target together with the policy used to rotate it.
#[derive(Debug)]
pub struct OutputTarget {
    file: Option<ActiveFile>,
    console: Console,
    mirror: ConsoleMirror,
    policy: RotationPolicy,
    day: DayStamp,
}

impl OutputTarget {
    /// Target that writes every line to `console`.
    #[must_use]
    pub fn console_only(console: Console) -> Self {
        Self {
            file: None,
            console,
            mirror: ConsoleMirror::default(),
            policy: RotationPolicy::console_only(),
            day: DayStamp::today(),
        }
    }

    /// Console handle lines are mirrored to.
    #[must_use]
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Active file, if one is open.
    #[must_use]
    pub fn file(&self) -> Option<&ActiveFile> {
        self.file.as_ref()
    }

    /// Policy the target rotates under.
    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Current console mirroring setting.
    #[must_use]
    pub const fn mirror(&self) -> ConsoleMirror {
        self.mirror
    }

    /// Closes the current file and opens the one `policy` selects for today.
    ///
    /// On error the target is left console-only; `policy` is still recorded
    /// so the next rotation check retries it.
    pub fn reopen(&mut self, policy: RotationPolicy, mirror: ConsoleMirror) -> Result<(), SinkError> {
        self.reopen_for_day(policy, mirror, DayStamp::today())
    }

    /// Same as [`reopen`](Self::reopen) for an explicit day.
    pub fn reopen_for_day(
        &mut self,
        policy: RotationPolicy,
        mirror: ConsoleMirror,
        day: DayStamp,
    ) -> Result<(), SinkError> {
        self.close_file();
        self.policy = policy;
        self.mirror = mirror;
        self.day = day;
        self.open_current()
    }

    /// Whether a line written on `today` must go to a different file.
    ///
    /// A target degraded to the console retries its directory once per day.
    #[must_use]
    pub fn needs_rotation(&self, today: &DayStamp) -> bool {
        match &self.file {
            Some(file) => file.needs_rotation(today, self.policy.max_size_bytes),
            None => !self.policy.is_console_only() && self.day != *today,
        }
    }

    /// Rotates when [`needs_rotation`](Self::needs_rotation) says so.
    ///
    /// Returns `Ok(true)` when a new file was selected.
    pub fn rotate_if_needed(&mut self, today: &DayStamp) -> Result<bool, SinkError> {
        if !self.needs_rotation(today) {
            return Ok(false);
        }
        self.close_file();
        self.day = today.clone();
        self.open_current()?;
        Ok(true)
    }

    /// Writes `line` plus a newline to the file and, when mirroring, the console.
    ///
    /// Without an open file the line goes to the console. A failed file write
    /// still reaches the console before the error is returned.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return self.console.write_line(line);
        };

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        let written = file.append(&bytes);

        if self.mirror.echoes_to_console() || written.is_err() {
            self.console.write_line(line)?;
        }
        written
    }

    /// Closes the active file; later lines go to the console.
    pub fn close(&mut self) {
        self.close_file();
        self.policy = RotationPolicy::console_only();
    }

    fn open_current(&mut self) -> Result<(), SinkError> {
        match resolve_active_file_for_day(&self.policy, &self.day)? {
            ResolvedTarget::Console { .. } => Ok(()),
            ResolvedTarget::File { path, day } => {
                let file = ActiveFile::open(&path, day)?;
                tracing::debug!(
                    target: "zclog::rotation",
                    path = %file.path().display(),
                    size = file.size(),
                    "switched active log file"
                );
                self.file = Some(file);
                Ok(())
            }
        }
    }

    fn close_file(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            if let Err(error) = file.close() {
                tracing::warn!(
                    target: "zclog::rotation",
                    path = %path.display(),
                    %error,
                    "failed to close log file"
                );
            }
        }
    }
}

impl Drop for OutputTarget {
    fn drop(&mut self) {
        self.close_file();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use test_support::CaptureBuffer;

    fn day(text: &str) -> DayStamp {
        DayStamp::parse(text).unwrap()
    }

    fn policy(dir: &std::path::Path, cap: u64) -> RotationPolicy {
        RotationPolicy {
            dir: Some(dir.to_path_buf()),
            prefix: "app".to_owned(),
            max_size_bytes: cap,
        }
    }

    #[test]
    fn console_only_target_writes_to_console() {
        let capture = CaptureBuffer::new();
        let mut target = OutputTarget::console_only(Console::from_writer(capture.clone()));

        target.write_line("hello").unwrap();

        assert_eq!(capture.lines(), vec!["hello"]);
        assert!(!target.needs_rotation(&day("29991231")));
    }

    #[test]
    fn file_only_mirror_keeps_console_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CaptureBuffer::new();
        let mut target = OutputTarget::console_only(Console::from_writer(capture.clone()));
        target
            .reopen_for_day(policy(dir.path(), 1024), ConsoleMirror::FileOnly, day("20240307"))
            .unwrap();

        target.write_line("only in file").unwrap();

        let path = dir.path().join("app_20240307_00001.log");
        assert_eq!(fs::read_to_string(path).unwrap(), "only in file\n");
        assert!(capture.contents().is_empty());
    }

    #[test]
    fn mirrored_lines_reach_both_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CaptureBuffer::new();
        let mut target = OutputTarget::console_only(Console::from_writer(capture.clone()));
        target
            .reopen_for_day(
                policy(dir.path(), 1024),
                ConsoleMirror::FileAndConsole,
                day("20240307"),
            )
            .unwrap();

        target.write_line("both").unwrap();

        let path = dir.path().join("app_20240307_00001.log");
        assert_eq!(fs::read_to_string(path).unwrap(), "both\n");
        assert_eq!(capture.lines(), vec!["both"]);
    }

    #[test]
    fn rotates_once_the_cap_is_reached() {
        let dir = tempfile::tempdir().unwrap();
        let today = day("20240307");
        let mut target = OutputTarget::console_only(Console::from_writer(CaptureBuffer::new()));
        target
            .reopen_for_day(policy(dir.path(), 8), ConsoleMirror::FileOnly, today.clone())
            .unwrap();

        target.write_line("1234567").unwrap();
        assert!(target.rotate_if_needed(&today).unwrap());
        target.write_line("next").unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("app_20240307_00001.log")).unwrap(),
            "1234567\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app_20240307_00002.log")).unwrap(),
            "next\n"
        );
    }

    #[test]
    fn rotates_on_day_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = OutputTarget::console_only(Console::from_writer(CaptureBuffer::new()));
        target
            .reopen_for_day(policy(dir.path(), 1024), ConsoleMirror::FileOnly, day("20240307"))
            .unwrap();
        target.write_line("monday").unwrap();

        assert!(target.rotate_if_needed(&day("20240308")).unwrap());
        target.write_line("tuesday").unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("app_20240308_00001.log")).unwrap(),
            "tuesday\n"
        );
    }

    #[test]
    fn failed_reopen_leaves_console_target() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let capture = CaptureBuffer::new();
        let mut target = OutputTarget::console_only(Console::from_writer(capture.clone()));

        let result = target.reopen_for_day(policy(&missing, 1024), ConsoleMirror::FileOnly, day("20240307"));

        assert!(matches!(result, Err(SinkError::ListDir { .. })));
        assert!(target.file().is_none());
        target.write_line("still visible").unwrap();
        assert_eq!(capture.lines(), vec!["still visible"]);
    }
}
