//! Helpers shared by the logger integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use logging::{Console, Logger};
use test_support::CaptureBuffer;

/// Fatal handler that unwinds instead of exiting the test process.
pub fn fatal_panics(line: &str) -> ! {
    panic!("fatal handler: {line}")
}

/// Logger writing its console output into a capture buffer.
pub fn capture_logger() -> (Logger, CaptureBuffer) {
    let capture = CaptureBuffer::new();
    let logger = Logger::builder()
        .console(Console::from_writer(capture.clone()))
        .fatal_handler(fatal_panics)
        .build()
        .unwrap();
    (logger, capture)
}

/// Log files in `dir`, oldest sequence first.
pub fn log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .collect();
    files.sort();
    files
}

/// Every line of every log file in `dir`, in file order.
pub fn file_lines(dir: &Path) -> Vec<String> {
    log_files(dir)
        .iter()
        .flat_map(|path| {
            fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Console writer that stalls record lines while the gate is held.
///
/// Lines starting with `[` are records; anything else, such as rotation notices,
/// passes straight through. `stalled` turns true once a record write is
/// waiting on the gate.
#[derive(Clone)]
pub struct GatedConsole {
    pub gate: Arc<Mutex<()>>,
    pub stalled: Arc<AtomicBool>,
    pub capture: CaptureBuffer,
}

impl GatedConsole {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Mutex::new(())),
            stalled: Arc::new(AtomicBool::new(false)),
            capture: CaptureBuffer::new(),
        }
    }
}

impl Write for GatedConsole {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.starts_with(b"[") {
            self.stalled.store(true, Ordering::Release);
            let _open = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        }
        self.capture.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
