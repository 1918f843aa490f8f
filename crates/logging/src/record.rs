//! crates/logging/src/record.rs
//! The unit of logging and its fixed line layout.

use std::borrow::Cow;
use std::fmt::Write as _;

use logging_sink::format_timestamp;
use time::OffsetDateTime;

use crate::severity::Severity;

/// Source location of a logging call.
///
/// `function` is the identity level overrides are keyed on. The call-site
/// macros fill it with `module_path!()`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Caller {
    /// Source file of the call.
    pub file: Cow<'static, str>,
    /// Line of the call.
    pub line: u32,
    /// Qualified name of the calling function or module.
    pub function: Cow<'static, str>,
}

impl Caller {
    /// Location known at compile time.
    #[must_use]
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file: Cow::Borrowed(file),
            line,
            function: Cow::Borrowed(function),
        }
    }

    /// Location assembled at runtime, for example by a bridge from another logger.
    #[must_use]
    pub fn owned(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: Cow::Owned(file.into()),
            line,
            function: Cow::Owned(function.into()),
        }
    }
}

/// One submitted log event.
///
/// Arguments are captured as owned strings when the record is built, so a
/// record can cross to the drain thread without borrowing from the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// Submission time.
    pub timestamp: OffsetDateTime,
    /// Severity the record was logged at.
    pub severity: Severity,
    /// Where the record came from.
    pub caller: Caller,
    /// Message template with `{}` placeholders.
    pub template: Cow<'static, str>,
    /// Rendered arguments, substituted in order.
    pub args: Vec<String>,
}

impl Record {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(
        severity: Severity,
        caller: Caller,
        template: impl Into<Cow<'static, str>>,
        args: Vec<String>,
    ) -> Self {
        Self {
            timestamp: logging_sink::now(),
            severity,
            caller,
            template: template.into(),
            args,
        }
    }

    /// Message with its arguments substituted.
    #[must_use]
    pub fn message(&self) -> String {
        render_message(&self.template, &self.args)
    }

    /// Formats the record as a single output line, without a newline.
    ///
    /// `[SEVERITY] time:<timestamp> code:<file> <line> func:<caller> <message>`
    #[must_use]
    pub fn format_line(&self) -> String {
        let message = self.message();
        let mut line = String::with_capacity(64 + self.caller.file.len() + message.len());
        let _ = write!(
            line,
            "[{}] time:{} code:{} {} func:{} {}",
            self.severity,
            format_timestamp(self.timestamp),
            self.caller.file,
            self.caller.line,
            self.caller.function,
            message
        );
        line
    }
}

/// Substitutes `args` into the `{}` placeholders of `template`.
///
/// `{{` and `}}` produce literal braces. A placeholder without an argument
/// is kept as `{}`; arguments without a placeholder are appended, separated
/// by spaces.
#[must_use]
pub fn render_message(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' if chars.peek() == Some(&'}') => {
                chars.next();
                match remaining.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str("{}"),
                }
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            other => out.push(other),
        }
    }

    for arg in remaining {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(arg);
    }
    out
}
