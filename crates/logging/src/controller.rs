//! crates/logging/src/controller.rs
//! The mode controller: owns the live configuration and routes every record.
//!
//! A [`Logger`] starts in LOCAL mode, where the calling thread formats and
//! writes each record. Switching to SERVER mode starts a drain loop fed by a
//! bounded [`DeliveryQueue`]; every later reconfiguration in SERVER mode
//! restarts that loop. Producers observe the loop through a shared running
//! flag and write synchronously whenever it is cleared, so a restart never
//! loses a record.
//!
//! Restart sequence:
//!
//! 1. Stop the current loop, bounded by the stop timeout. On expiry the call
//!    fails and no second loop is started.
//! 2. Take the queue write lock, which waits out producers mid-send, and
//!    collect whatever the old loop left behind.
//! 3. Replace the queue if its capacity changed and reopen the output under
//!    the merged configuration.
//! 4. Write the collected records, start the new loop, release the lock.
//! 5. Start the control listener if it has never been started.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use logging_sink::{Console, OutputTarget};

use crate::config::{Config, ConfigUpdate, Mode, OverflowPolicy};
use crate::drain::{DrainContext, DrainHandle};
use crate::error::{ControlError, LogError};
use crate::levels::LevelControl;
use crate::queue::{Admission, DeliveryQueue, drop_notice};
use crate::record::{Caller, Record};
use crate::severity::Severity;
use crate::stats::{Stats, StatsSnapshot};

#[cfg(feature = "control-server")]
use crate::control::server::ControlListener;

/// Default bound on waiting for a drain loop to stop.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Action taken after a FATAL record has been written.
pub type FatalHandler = fn(&str) -> !;

fn exit_process(_line: &str) -> ! {
    std::process::exit(1)
}

/// Configures and builds a [`Logger`].
#[derive(Debug)]
pub struct LoggerBuilder {
    console: Option<Console>,
    notices: Option<Console>,
    fatal: FatalHandler,
    stop_timeout: Duration,
    config: ConfigUpdate,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            console: None,
            notices: None,
            fatal: exit_process,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            config: ConfigUpdate::default(),
        }
    }
}

impl LoggerBuilder {
    /// Sends console output to `console` instead of standard output.
    pub fn console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// Sends queue overflow notices to `notices` instead of standard error.
    pub fn notice_console(mut self, notices: Console) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Replaces the action run after a FATAL record (default: exit with status 1).
    pub fn fatal_handler(mut self, handler: FatalHandler) -> Self {
        self.fatal = handler;
        self
    }

    /// Bounds how long a restart waits for the previous drain loop.
    pub const fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Initial configuration, merged over the defaults without starting anything.
    pub fn config(mut self, update: ConfigUpdate) -> Self {
        self.config = update;
        self
    }

    /// Builds the logger.
    ///
    /// A LOCAL configuration is only validated and recorded; the writer opens
    /// lazily on the first record. A SERVER configuration starts the drain
    /// loop before returning.
    pub fn build(self) -> Result<Logger, LogError> {
        let mut config = Config::default().merged(&self.config);
        config.validate()?;
        // SERVER is entered through configure so startup follows the restart path.
        let requested_mode = config.mode;
        config.mode = Mode::Local;

        let console = self.console.unwrap_or_default();
        let notices = self.notices.unwrap_or_else(Console::stderr);
        let shared = Shared::new(config, console, notices, self.fatal, self.stop_timeout);
        let logger = Logger {
            shared: Arc::new(shared),
        };
        if requested_mode == Mode::Server {
            logger.configure(ConfigUpdate::new().mode(Mode::Server))?;
        }
        Ok(logger)
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    drain: Option<DrainHandle>,
    #[cfg(feature = "control-server")]
    listener: Option<ControlListener>,
}

#[derive(Debug)]
struct Shared {
    config: RwLock<Arc<Config>>,
    mode: AtomicU8,
    policy: AtomicU8,
    levels: Arc<LevelControl>,
    console: Console,
    notices: Console,
    output: Arc<Mutex<OutputTarget>>,
    queue: RwLock<DeliveryQueue>,
    running: Arc<AtomicBool>,
    exclusive: Arc<Mutex<()>>,
    local_ready: AtomicBool,
    lifecycle: Mutex<Lifecycle>,
    stats: Arc<Stats>,
    fatal: FatalHandler,
    stop_timeout: Duration,
}

/// Handle on a logging instance. Clones share the same instance.
///
/// The instance shuts down when the last handle is dropped.
#[derive(Clone, Debug)]
pub struct Logger {
    shared: Arc<Shared>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Console-only LOCAL logger with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_console(Console::stdout())
    }

    /// Console-only LOCAL logger writing to `console`.
    #[must_use]
    pub fn with_console(console: Console) -> Self {
        Self {
            shared: Arc::new(Shared::new(
                Config::default(),
                console,
                Console::stderr(),
                exit_process,
                DEFAULT_STOP_TIMEOUT,
            )),
        }
    }

    /// Starts building a logger with a custom console, fatal handler or timeout.
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Snapshot of the live configuration.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(
            &self
                .shared
                .config
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Current delivery mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        Mode::from_code(self.shared.mode.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Whether a drain loop is currently accepting records.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Per-caller filter shared with the control listener.
    #[must_use]
    pub fn levels(&self) -> &LevelControl {
        &self.shared.levels
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Address the control listener is bound to, once started.
    #[cfg(feature = "control-server")]
    #[must_use]
    pub fn control_addr(&self) -> Option<std::net::SocketAddr> {
        self.shared
            .lock_lifecycle()
            .listener
            .as_ref()
            .map(ControlListener::local_addr)
    }

    /// Merges `update` into the live configuration and applies it.
    ///
    /// In LOCAL mode the synchronous writer is opened on first use only;
    /// later calls update filtering and queue settings without reopening it.
    /// In SERVER mode every call restarts the drain loop.
    pub fn configure(&self, update: ConfigUpdate) -> Result<(), LogError> {
        let mut lifecycle = self.shared.lock_lifecycle();
        let current = self.config();
        let next = current.merged(&update);
        next.validate()?;

        match (current.mode, next.mode) {
            (Mode::Local, Mode::Local) => {
                self.shared.store_config(next);
                if !self.shared.local_ready.load(Ordering::Acquire) {
                    self.shared.init_local();
                }
                Ok(())
            }
            (Mode::Server, Mode::Local) => {
                self.shared.stop_drain(&mut lifecycle)?;
                self.shared.store_config(next);
                self.shared.init_local();
                self.shared.flush_pending();
                Ok(())
            }
            (_, Mode::Server) => self.shared.restart_server(&mut lifecycle, next),
        }
    }

    /// Whether a record at `severity` from `function` would be written.
    #[must_use]
    pub fn enabled(&self, severity: Severity, function: &str) -> bool {
        self.shared.levels.enabled(severity, function)
    }

    /// Builds and submits a record if the filter lets it through.
    ///
    /// PANIC unwinds the calling thread after the record is written. FATAL
    /// runs the fatal handler, which by default exits the process.
    pub fn log(
        &self,
        severity: Severity,
        caller: Caller,
        template: impl Into<Cow<'static, str>>,
        args: Vec<String>,
    ) {
        if !self.enabled(severity, &caller.function) {
            return;
        }
        self.submit(Record::new(severity, caller, template, args));
    }

    /// Routes an already built record, bypassing the filter.
    pub fn submit(&self, record: Record) {
        if record.severity.is_terminal() {
            self.terminate(&record);
        }

        match self.mode() {
            Mode::Local => {
                self.shared.ensure_local_init();
                self.shared.write_direct(&record);
            }
            Mode::Server => self.enqueue(record),
        }
    }

    /// Installs a level override for `logger`.
    pub fn set_level(&self, logger: &str, level: Severity) -> Result<(), LogError> {
        self.shared.levels.set_override(logger, level)?;
        Ok(())
    }

    /// Applies a level control request given as raw query values.
    pub fn handle_control(
        &self,
        logger: Option<&str>,
        level: Option<&str>,
    ) -> Result<(String, Severity), ControlError> {
        self.shared.levels.apply_request(logger, level)
    }

    /// Stops the drain loop and the listener, writes queued records and closes the file.
    ///
    /// Records logged afterwards go to the console.
    pub fn shutdown(&self) -> Result<(), LogError> {
        let mut lifecycle = self.shared.lock_lifecycle();
        self.shared.shutdown(&mut lifecycle)
    }

    fn enqueue(&self, record: Record) {
        let shared = &self.shared;
        if !shared.running.load(Ordering::Acquire) {
            shared.write_direct(&record);
            return;
        }

        let policy =
            OverflowPolicy::from_code(shared.policy.load(Ordering::Acquire)).unwrap_or_default();
        let queue = shared.queue.read().unwrap_or_else(PoisonError::into_inner);
        let admission = queue.admit(record, policy, &shared.running);
        drop(queue);

        match admission {
            Admission::Queued => {}
            Admission::Dropped(record) => {
                shared.stats.record_dropped();
                let _ = shared.notices.write_line(&drop_notice(&record));
            }
            Admission::Stopped(record) => {
                shared.write_direct(&record);
            }
        }
    }

    fn terminate(&self, record: &Record) -> ! {
        if self.mode() == Mode::Local {
            self.shared.ensure_local_init();
        }
        let line = self.shared.write_direct(record);
        let _ = self.shared.console.flush();

        match record.severity {
            Severity::Fatal => (self.shared.fatal)(&line),
            _ => panic!("{}", record.message()),
        }
    }
}

impl Shared {
    fn new(
        config: Config,
        console: Console,
        notices: Console,
        fatal: FatalHandler,
        stop_timeout: Duration,
    ) -> Self {
        let output = OutputTarget::console_only(console.clone());
        Self {
            levels: Arc::new(LevelControl::new(config.global_level)),
            mode: AtomicU8::new(config.mode.code()),
            policy: AtomicU8::new(config.overflow_policy.code()),
            queue: RwLock::new(DeliveryQueue::new(config.queue_capacity)),
            config: RwLock::new(Arc::new(config)),
            console,
            notices,
            output: Arc::new(Mutex::new(output)),
            running: Arc::new(AtomicBool::new(false)),
            exclusive: Arc::new(Mutex::new(())),
            local_ready: AtomicBool::new(false),
            lifecycle: Mutex::new(Lifecycle::default()),
            stats: Arc::new(Stats::default()),
            fatal,
            stop_timeout,
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_output(&self) -> MutexGuard<'_, OutputTarget> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `config` together with the filter and overflow policy it implies.
    fn store_config(&self, config: Config) {
        self.levels.set_global(config.global_level);
        self.policy
            .store(config.overflow_policy.code(), Ordering::Release);
        self.mode.store(config.mode.code(), Ordering::Release);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    fn current_config(&self) -> Arc<Config> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Formats and writes `record` on the calling thread; returns the line.
    fn write_direct(&self, record: &Record) -> String {
        let line = record.format_line();
        let written = self.lock_output().write_line(&line);
        match written {
            Ok(()) => self.stats.record_written(),
            Err(error) => tracing::warn!(target: "zclog::sync", %error, "failed to write record"),
        }
        line
    }

    fn ensure_local_init(&self) {
        if self.local_ready.load(Ordering::Acquire) {
            return;
        }
        let _lifecycle = self.lock_lifecycle();
        if !self.local_ready.load(Ordering::Acquire)
            && self.mode.load(Ordering::Acquire) == Mode::Local.code()
        {
            self.init_local();
        }
    }

    /// Opens the synchronous writer; failures degrade to the console.
    ///
    /// Callers hold the lifecycle lock.
    fn init_local(&self) {
        let config = self.current_config();
        let mut output = self.lock_output();
        if let Err(error) = output.reopen(config.rotation_policy(), config.console_mirror()) {
            let _ = self
                .console
                .write_line(&format!("zclog: cannot open log file, writing to console: {error}"));
            tracing::warn!(target: "zclog::sync", %error, "local writer degraded to console");
        }
        self.local_ready.store(true, Ordering::Release);
        self.stats.record_local_init();
        tracing::debug!(
            target: "zclog::sync",
            file = ?output.file().map(|file| file.path().display().to_string()),
            "local writer initialized"
        );
    }

    fn stop_drain(&self, lifecycle: &mut Lifecycle) -> Result<(), LogError> {
        self.running.store(false, Ordering::Release);
        if let Some(drain) = lifecycle.drain.as_mut() {
            drain.stop(self.stop_timeout)?;
        }
        lifecycle.drain = None;
        Ok(())
    }

    /// Writes records left in the queue, oldest first.
    ///
    /// The write lock waits out producers that saw the loop running and are
    /// still inside `admit`.
    fn flush_pending(&self) {
        let pending = self
            .queue
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take_pending();
        for record in &pending {
            self.write_direct(record);
        }
    }

    fn restart_server(&self, lifecycle: &mut Lifecycle, next: Config) -> Result<(), LogError> {
        self.stop_drain(lifecycle)?;
        self.local_ready.store(false, Ordering::Release);

        let policy = next.rotation_policy();
        let mirror = next.console_mirror();
        let capacity = next.queue_capacity;
        self.store_config(next);

        let mut queue = self.queue.write().unwrap_or_else(PoisonError::into_inner);
        let pending = queue.take_pending();
        if queue.capacity() != capacity {
            *queue = DeliveryQueue::new(capacity);
        }

        let reopened = self.lock_output().reopen(policy, mirror);
        for record in &pending {
            self.write_direct(record);
        }
        if let Err(error) = reopened {
            tracing::error!(target: "zclog::drain", %error, "cannot open log file for SERVER mode");
            return Err(error.into());
        }

        let handle = DrainHandle::spawn(DrainContext {
            receiver: queue.receiver(),
            output: Arc::clone(&self.output),
            running: Arc::clone(&self.running),
            exclusive: Arc::clone(&self.exclusive),
            stats: Arc::clone(&self.stats),
        })?;
        lifecycle.drain = Some(handle);
        drop(queue);

        self.ensure_listener(lifecycle)
    }

    #[cfg(feature = "control-server")]
    fn ensure_listener(&self, lifecycle: &mut Lifecycle) -> Result<(), LogError> {
        let config = self.current_config();
        if lifecycle.listener.is_some() || config.disable_control_listener {
            return Ok(());
        }
        let listener = ControlListener::start(&config.control_addr(), Arc::clone(&self.levels))?;
        lifecycle.listener = Some(listener);
        Ok(())
    }

    #[cfg(not(feature = "control-server"))]
    fn ensure_listener(&self, _lifecycle: &mut Lifecycle) -> Result<(), LogError> {
        Ok(())
    }

    fn shutdown(&self, lifecycle: &mut Lifecycle) -> Result<(), LogError> {
        let was_draining = lifecycle.drain.is_some();
        self.stop_drain(lifecycle)?;
        if was_draining && !self.queue.read().unwrap_or_else(PoisonError::into_inner).is_empty() {
            // The loop closed the file on exit; leftovers belong in it too.
            let config = self.current_config();
            if let Err(error) = self
                .lock_output()
                .reopen(config.rotation_policy(), config.console_mirror())
            {
                tracing::warn!(target: "zclog::drain", %error, "queued records go to the console");
            }
        }
        self.flush_pending();
        self.lock_output().close();
        let _ = self.console.flush();
        let _ = self.notices.flush();
        #[cfg(feature = "control-server")]
        if let Some(mut listener) = lifecycle.listener.take() {
            listener.stop();
        }
        Ok(())
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let mut lifecycle = std::mem::take(
            self.lifecycle
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if let Err(error) = self.shutdown(&mut lifecycle) {
            tracing::error!(target: "zclog::drain", %error, "logger shutdown failed");
        }
    }
}
