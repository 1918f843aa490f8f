/// Controls whether records written to a log file are also echoed to the console.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConsoleMirror {
    /// Write every record to the file and the console.
    #[default]
    FileAndConsole,
    /// Write records to the file only.
    FileOnly,
}

impl ConsoleMirror {
    /// Reports whether records reach the console while a file is open.
    ///
    /// Without a file every record goes to the console regardless of the
    /// mirror setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging_sink::ConsoleMirror;
    ///
    /// assert!(ConsoleMirror::FileAndConsole.echoes_to_console());
    /// assert!(!ConsoleMirror::FileOnly.echoes_to_console());
    /// ```
    #[must_use]
    pub const fn echoes_to_console(self) -> bool {
        matches!(self, Self::FileAndConsole)
    }

    /// Maps a "suppress console output" flag onto a mirror setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging_sink::ConsoleMirror;
    ///
    /// assert_eq!(ConsoleMirror::from_suppressed(true), ConsoleMirror::FileOnly);
    /// assert_eq!(ConsoleMirror::from_suppressed(false), ConsoleMirror::FileAndConsole);
    /// ```
    #[must_use]
    pub const fn from_suppressed(suppress_console: bool) -> Self {
        if suppress_console {
            Self::FileOnly
        } else {
            Self::FileAndConsole
        }
    }
}

impl From<ConsoleMirror> for bool {
    fn from(mirror: ConsoleMirror) -> Self {
        mirror.echoes_to_console()
    }
}
