//! crates/logging/src/tracing_bridge.rs
//! Bridge from the `tracing` ecosystem into a zclog [`Logger`].
//!
//! [`ZclogLayer`] is a tracing-subscriber layer that turns each tracing event
//! into a [`Record`](crate::Record): the level maps onto a [`Severity`], the
//! event's module path becomes the caller identity, and the `message` field
//! becomes the template. Filtering uses the logger's own levels, so runtime
//! overrides apply to bridged events too.
//!
//! Events whose target starts with `zclog::` are the library's own
//! diagnostics and are never forwarded.
//!
//! # Usage
//!
//! ```
//! use logging::{Logger, ZclogLayer};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let logger = Logger::new();
//! let subscriber = tracing_subscriber::registry().with(ZclogLayer::new(logger));
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::warn!("replica lag {} ms", 250);
//! });
//! ```

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::controller::Logger;
use crate::record::Caller;
use crate::severity::Severity;

/// Target prefix of the library's own diagnostics.
const INTERNAL_TARGET_PREFIX: &str = "zclog::";

/// Tracing layer that writes events through a [`Logger`].
#[derive(Clone, Debug)]
pub struct ZclogLayer {
    logger: Logger,
}

impl ZclogLayer {
    /// Forwards events to `logger`.
    #[must_use]
    pub const fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Severity a tracing level is recorded at. TRACE folds into DEBUG.
    #[must_use]
    pub const fn severity_for(level: &Level) -> Severity {
        match *level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            Level::INFO => Severity::Info,
            Level::DEBUG | Level::TRACE => Severity::Debug,
        }
    }
}

impl<S> Layer<S> for ZclogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(INTERNAL_TARGET_PREFIX) {
            return;
        }

        let severity = Self::severity_for(metadata.level());
        let function = metadata.module_path().unwrap_or_else(|| metadata.target());
        if !self.logger.enabled(severity, function) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.message else {
            return;
        };
        let caller = Caller::new(
            metadata.file().unwrap_or("<unknown>"),
            metadata.line().unwrap_or(0),
            function,
        );
        // The rendered message may contain literal braces.
        self.logger.log(severity, caller, "{}", vec![message]);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        }
    }
}
