//! crates/logging/src/drain.rs
//! The single consumer of the delivery queue.
//!
//! A drain loop owns a dedicated thread. It holds an exclusive guard for its
//! whole lifetime, so a second loop sharing the same guard refuses to start
//! while the first is alive. Each record is checked for rotation, formatted
//! and written under the output lock. A message on the shutdown channel
//! clears the running flag, closes the active file and ends the loop; records
//! still queued at that point are left for the controller to write.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use logging_sink::{DayStamp, OutputTarget};

use crate::error::LogError;
use crate::record::Record;
use crate::stats::Stats;

/// Interval at which [`DrainHandle::stop`] checks for loop exit.
const STOP_POLL: Duration = Duration::from_millis(5);

/// Everything a drain loop needs, shared with the controller.
#[derive(Clone, Debug)]
pub(crate) struct DrainContext {
    pub(crate) receiver: Receiver<Record>,
    pub(crate) output: Arc<Mutex<OutputTarget>>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) exclusive: Arc<Mutex<()>>,
    pub(crate) stats: Arc<Stats>,
}

/// Controller-side handle on a running drain loop.
#[derive(Debug)]
pub(crate) struct DrainHandle {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl DrainHandle {
    /// Starts a drain loop and waits until it holds the exclusive guard.
    pub(crate) fn spawn(context: DrainContext) -> Result<Self, LogError> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<bool>(1);
        let running = Arc::clone(&context.running);

        let thread = thread::Builder::new()
            .name("zclog-drain".to_owned())
            .spawn(move || run(&context, &shutdown_rx, &ready_tx))
            .map_err(LogError::SpawnDrain)?;

        match ready_rx.recv() {
            Ok(true) => {
                tracing::debug!(target: "zclog::drain", "drain loop started");
                Ok(Self {
                    shutdown: shutdown_tx,
                    thread: Some(thread),
                    running,
                })
            }
            Ok(false) => {
                let _ = thread.join();
                Err(LogError::DrainAlreadyRunning)
            }
            Err(_) => {
                let _ = thread.join();
                Err(LogError::SpawnDrain(io::Error::other(
                    "drain loop exited during startup",
                )))
            }
        }
    }

    /// Whether the loop thread has exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signals shutdown and waits up to `timeout` for the loop to exit.
    ///
    /// On timeout the handle stays usable so the caller can retry; the loop
    /// keeps its exclusive guard until it actually exits.
    pub(crate) fn stop(&mut self, timeout: Duration) -> Result<(), LogError> {
        self.running.store(false, Ordering::Release);
        let _ = self.shutdown.try_send(());

        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                tracing::error!(target: "zclog::drain", ?timeout, "drain loop did not stop in time");
                return Err(LogError::DrainStopTimeout(timeout));
            }
            thread::sleep(STOP_POLL);
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!(target: "zclog::drain", "drain loop panicked");
            }
        }
        Ok(())
    }
}

fn run(context: &DrainContext, shutdown: &Receiver<()>, ready: &Sender<bool>) {
    let _exclusive = match context.exclusive.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => {
            tracing::warn!(target: "zclog::drain", "another drain loop is still running");
            let _ = ready.send(false);
            return;
        }
    };
    context.running.store(true, Ordering::Release);
    context.stats.record_drain_start();
    let _ = ready.send(true);

    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(context.receiver) -> message => match message {
                Ok(record) => write_record(context, &record),
                Err(_) => break,
            },
        }
    }

    context.running.store(false, Ordering::Release);
    context
        .output
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .close();
    tracing::debug!(target: "zclog::drain", "drain loop stopped");
}

fn write_record(context: &DrainContext, record: &Record) {
    let today = DayStamp::today();
    let mut output = context.output.lock().unwrap_or_else(PoisonError::into_inner);

    if let Err(error) = output.rotate_if_needed(&today) {
        let _ = output
            .console()
            .write_line(&format!("zclog: log file rotation failed, writing to console: {error}"));
        tracing::warn!(target: "zclog::rotation", %error, "rotation failed, degraded to console");
    }

    match output.write_line(&record.format_line()) {
        Ok(()) => context.stats.record_written(),
        Err(error) => tracing::warn!(target: "zclog::drain", %error, "failed to write record"),
    }
}
