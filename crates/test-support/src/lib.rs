#![deny(unsafe_code)]

//! Shared helpers for zclog tests.
//!
//! Provides a cloneable in-memory writer that stands in for the console,
//! scratch directories backed by [`tempfile`], and a helper that reserves a
//! loopback port for listener tests.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// In-memory writer whose clones share one buffer.
///
/// Hand one clone to the code under test as its console and keep another to
/// inspect what was written.
#[derive(Clone, Debug, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Returns the captured output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Number of captured lines containing `needle`.
    #[must_use]
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lines().iter().filter(|line| line.contains(needle)).count()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Creates a fresh scratch directory removed on drop.
#[must_use]
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("create scratch directory")
}

/// Reserves an unused loopback port.
///
/// The temporary socket is closed before returning, so another process could in
/// theory grab the port first; good enough for tests.
#[must_use]
pub fn free_local_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral socket");
    let addr: SocketAddr = listener.local_addr().expect("ephemeral address");
    addr.port()
}

/// Polls `condition` every few milliseconds until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
