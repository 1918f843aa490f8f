//! crates/logging/src/macros.rs
//! Call-site macros that capture the caller and render arguments.
//!
//! Each macro checks the filter before rendering any argument, so disabled
//! records cost one level lookup. Templates use `{}` placeholders filled in
//! order with the `Display` form of the arguments.

/// Location of the macro invocation as a [`Caller`](crate::Caller).
///
/// The function identity is the enclosing module path.
#[macro_export]
macro_rules! caller {
    () => {
        $crate::Caller::new(::std::file!(), ::std::line!(), ::std::module_path!())
    };
}

/// Logs at an explicit severity.
///
/// # Example
/// ```
/// use logging::{Logger, Severity};
///
/// let logger = Logger::new();
/// logging::log!(logger, Severity::Info, "listening on port {}", 9300);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let severity = $severity;
        if logger.enabled(severity, ::std::module_path!()) {
            logger.log(
                severity,
                $crate::caller!(),
                $template,
                ::std::vec![$(::std::string::ToString::to_string(&$arg)),*],
            );
        }
    }};
}

/// Logs a DEBUG record.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($rest)+)
    };
}

/// Logs an INFO record.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($rest)+)
    };
}

/// Logs a WARNING record.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warning, $($rest)+)
    };
}

/// Logs an ERROR record.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($rest)+)
    };
}

/// Writes a PANIC record synchronously, then panics with its message.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Severity::Panic, $($rest)+)
    };
}

/// Writes a FATAL record synchronously, then runs the logger's fatal handler.
///
/// The default handler exits the process with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Severity::Fatal, $($rest)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Logger, Severity};
    use logging_sink::Console;
    use test_support::CaptureBuffer;

    fn capture_logger() -> (Logger, CaptureBuffer) {
        let capture = CaptureBuffer::new();
        (Logger::with_console(Console::from_writer(capture.clone())), capture)
    }

    #[test]
    fn macros_record_caller_and_arguments() {
        let (logger, capture) = capture_logger();
        crate::info!(logger, "user {} logged in from {}", "ada", "10.0.0.1");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.starts_with("[INFO] time:"), "{line}");
        assert!(line.contains("macros.rs "), "{line}");
        assert!(line.contains(&format!("func:{}", module_path!())), "{line}");
        assert!(line.ends_with("user ada logged in from 10.0.0.1"), "{line}");
    }

    #[test]
    fn filtered_records_skip_argument_rendering() {
        struct Loud;
        impl std::fmt::Display for Loud {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                panic!("rendered a filtered argument");
            }
        }

        let (logger, capture) = capture_logger();
        crate::debug!(logger, "hidden {}", Loud);
        assert!(capture.contents().is_empty());
    }

    #[test]
    fn override_on_the_module_path_enables_debug() {
        let (logger, capture) = capture_logger();
        logger.set_level(module_path!(), Severity::Debug).unwrap();

        crate::debug!(logger, "visible {}", 1);
        crate::warn!(logger, "plain warning");
        assert_eq!(capture.count_matching("[DEBUG]"), 1);
        assert_eq!(capture.count_matching("[WARNING]"), 1);
    }

    #[test]
    #[should_panic(expected = "disk gone")]
    fn panic_log_unwinds_after_writing() {
        let (logger, _capture) = capture_logger();
        crate::panic_log!(logger, "disk {}", "gone");
    }
}
