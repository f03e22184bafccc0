//! Bridge from `tracing` events into a [`Logger`].
//!
//! Lets crates that already emit `tracing` events share the logger's sinks:
//!
//! ```no_run
//! use tracing_subscriber::prelude::*;
//!
//! tracing_subscriber::registry()
//!     .with(twlc::LoggerLayer::for_default_logger())
//!     .init();
//! ```

use chrono::Local;
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::logger::{Logger, Record, logger};
use crate::severity::Severity;

enum Target {
    Shared(Arc<Logger>),
    Default,
}

/// A tracing Layer that writes every event through a [`Logger`].
///
/// I/O failures are reported on stderr; the layer never terminates the process.
pub struct LoggerLayer {
    target: Target,
}

impl LoggerLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            target: Target::Shared(logger),
        }
    }

    /// Forward events to the process-wide default logger.
    pub fn for_default_logger() -> Self {
        Self {
            target: Target::Default,
        }
    }

    fn logger(&self) -> &Logger {
        match &self.target {
            Target::Shared(logger) => logger,
            Target::Default => logger(),
        }
    }
}

/// Severity used for events at `level`.
pub fn severity_for(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warning,
        Level::INFO => Severity::Info,
        Level::DEBUG => Severity::Debug,
        _ => Severity::Trace,
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.finish();

        let record = Record {
            severity: severity_for(metadata.level()),
            message: &message,
            timestamp: Local::now(),
            file: metadata.file().unwrap_or("???"),
            line: metadata.line().unwrap_or(0),
        };

        if let Err(err) = self.logger().write_record(&record) {
            eprintln!("twlc: {err}");
        }
    }
}

/// Collects the `message` field plus any other fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}
