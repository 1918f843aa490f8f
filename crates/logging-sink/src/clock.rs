//! crates/logging-sink/src/clock.rs
//! Wall-clock helpers shared by rotation and record formatting.

use std::fmt;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// Layout of the `time:` field in every formatted log line.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month padding:zero]-[day padding:zero] [hour padding:zero]:[minute padding:zero]:[second padding:zero]"
);

const DAY_STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month padding:zero][day padding:zero]");

/// Returns the current local time, or UTC when the local offset is unknown.
///
/// `time` refuses to read the local offset once the process is
/// multi-threaded on some platforms; UTC keeps the stamps monotonic there.
#[must_use]
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Formats `at` using [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Calendar day in `yyyyMMdd` form, as embedded in rotated file names.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DayStamp(String);

impl DayStamp {
    /// Stamp for the current day.
    #[must_use]
    pub fn today() -> Self {
        Self::from_datetime(now())
    }

    /// Stamp for the calendar day containing `at`.
    #[must_use]
    pub fn from_datetime(at: OffsetDateTime) -> Self {
        let text = at.format(DAY_STAMP_FORMAT).unwrap_or_else(|_| {
            format!(
                "{:04}{:02}{:02}",
                at.year(),
                u8::from(at.month()),
                at.day()
            )
        });
        Self(text)
    }

    /// Builds a stamp from an already formatted `yyyyMMdd` string.
    ///
    /// Returns `None` unless the input is exactly eight ASCII digits.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        (text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit())).then(|| Self(text.to_owned()))
    }

    /// Borrows the stamp text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
