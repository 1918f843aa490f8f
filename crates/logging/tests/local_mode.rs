//! Integration tests for synchronous (LOCAL mode) delivery.

mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};

use common::{capture_logger, file_lines, log_files};
use logging::{Caller, Config, ConfigUpdate, Console, Logger, Mode, Severity};
use test_support::{CaptureBuffer, scratch_dir};

const CALLER: Caller = Caller::new("svc/handler.rs", 42, "svc::handler");

#[test]
fn default_logger_writes_info_to_the_console() {
    let (logger, capture) = capture_logger();
    assert_eq!(logger.mode(), Mode::Local);
    assert_eq!(*logger.config(), Config::default());

    logger.log(Severity::Info, CALLER, "started", Vec::new());
    logger.log(Severity::Debug, CALLER, "hidden", Vec::new());

    let lines = capture.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[INFO] time:"), "{}", lines[0]);
    assert!(
        lines[0].ends_with("code:svc/handler.rs 42 func:svc::handler started"),
        "{}",
        lines[0]
    );
}

#[test]
fn writer_is_initialized_once() {
    let dir = scratch_dir();
    let capture = CaptureBuffer::new();
    let logger = Logger::builder()
        .console(Console::from_writer(capture.clone()))
        .config(ConfigUpdate::new().dir(dir.path()).suppress_console(true))
        .build()
        .unwrap();
    assert_eq!(logger.stats().local_inits, 0);
    assert!(log_files(dir.path()).is_empty());

    for index in 0..5 {
        logger.log(Severity::Info, CALLER, "line {}", vec![index.to_string()]);
    }
    logger.configure(ConfigUpdate::new().global_level(Severity::Debug)).unwrap();
    logger.log(Severity::Debug, CALLER, "after reconfigure", Vec::new());

    assert_eq!(logger.stats().local_inits, 1);
    assert_eq!(log_files(dir.path()).len(), 1);

    let lines = file_lines(dir.path());
    assert_eq!(lines.len(), 6);
    for (index, line) in lines.iter().take(5).enumerate() {
        assert!(line.ends_with(&format!("line {index}")), "{line}");
    }
    assert!(lines[5].starts_with("[DEBUG]"));
    assert!(capture.contents().is_empty());
}

#[test]
fn configure_in_local_mode_opens_the_writer() {
    let dir = scratch_dir();
    let (logger, capture) = capture_logger();
    logger.configure(ConfigUpdate::new().dir(dir.path())).unwrap();

    assert_eq!(logger.stats().local_inits, 1);
    assert_eq!(log_files(dir.path()).len(), 1);

    logger.log(Severity::Warning, CALLER, "disk at {}%", vec!["91".to_owned()]);
    assert_eq!(file_lines(dir.path()).len(), 1);
    assert_eq!(capture.count_matching("disk at 91%"), 1);
}

#[test]
fn override_takes_precedence_over_global_level() {
    let (logger, capture) = capture_logger();
    logger
        .configure(ConfigUpdate::new().global_level(Severity::Error))
        .unwrap();
    logger.set_level("svc::handler", Severity::Debug).unwrap();

    let other = Caller::new("svc/other.rs", 1, "svc::other");
    logger.log(Severity::Debug, CALLER, "override lets this through", Vec::new());
    logger.log(Severity::Warning, other.clone(), "global blocks this", Vec::new());
    logger.log(Severity::Error, other, "global allows this", Vec::new());

    assert_eq!(capture.count_matching("override lets this through"), 1);
    assert_eq!(capture.count_matching("global blocks this"), 0);
    assert_eq!(capture.count_matching("global allows this"), 1);
}

#[test]
fn panic_record_is_written_before_unwinding() {
    let (logger, capture) = capture_logger();
    logger
        .configure(ConfigUpdate::new().global_level(Severity::Fatal))
        .unwrap();

    let result = catch_unwind(AssertUnwindSafe(|| {
        logger.log(Severity::Panic, CALLER, "invariant {} broken", vec!["x".to_owned()]);
    }));

    let payload = result.unwrap_err();
    assert_eq!(
        payload.downcast_ref::<String>().map(String::as_str),
        Some("invariant x broken")
    );
    assert_eq!(capture.count_matching("[PANIC]"), 1);
}

#[test]
fn fatal_record_runs_the_fatal_handler() {
    let (logger, capture) = capture_logger();

    let result = catch_unwind(AssertUnwindSafe(|| {
        logger.log(Severity::Fatal, CALLER, "cannot continue", Vec::new());
    }));

    let message = result
        .unwrap_err()
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(message.starts_with("fatal handler: [FATAL]"), "{message}");
    assert!(message.ends_with("cannot continue"), "{message}");
    assert_eq!(capture.count_matching("[FATAL]"), 1);
}

#[test]
fn unusable_directory_degrades_to_console() {
    let dir = scratch_dir();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"occupied").unwrap();

    let (logger, capture) = capture_logger();
    logger.configure(ConfigUpdate::new().dir(&blocker)).unwrap();
    logger.log(Severity::Info, CALLER, "still visible", Vec::new());

    assert_eq!(capture.count_matching("cannot open log file"), 1);
    assert_eq!(capture.count_matching("still visible"), 1);
}

#[test]
fn fatal_handler_is_used_by_the_fatal_macro() {
    let (logger, capture) = capture_logger();
    let result = catch_unwind(AssertUnwindSafe(|| {
        logging::fatal!(logger, "shutting down: {}", "config missing");
    }));

    assert!(result.is_err());
    assert_eq!(capture.count_matching("shutting down: config missing"), 1);
}
