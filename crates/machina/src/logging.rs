//! Per-robot logging handle.
//!
//! Every robot gets its own [`RobotLogger`], cloned into each cursor at
//! construction. Messages always go to `tracing`; listeners that want the
//! raw stream (a UI console, a test) can attach an `async_channel` receiver.
//! Forwarding uses `try_send`, so a slow, full or dropped listener never
//! blocks the core.

use std::fmt;
use std::sync::Arc;

use async_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Severity of a log entry, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Failures that stop an operation
    Error,
    /// Rejected actions and recoverable problems
    Warning,
    /// Notable state changes
    Info,
    /// Routine progress
    Verbose,
    /// Internals
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// A single forwarded log message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity
    pub level: LogLevel,
    /// Robot or cursor that produced the message, e.g. `"robot/issue"`
    pub source: String,
    /// Message text
    pub message: String,
}

/// Cloneable logging handle scoped to one robot (or one of its cursors).
#[derive(Clone)]
pub struct RobotLogger {
    source: Arc<str>,
    sink: Option<Sender<LogEntry>>,
}

impl RobotLogger {
    /// A logger that only emits `tracing` events.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Arc::from(source.into()),
            sink: None,
        }
    }

    /// A logger that also forwards entries to `sink`.
    pub fn with_sink(source: impl Into<String>, sink: Sender<LogEntry>) -> Self {
        Self {
            source: Arc::from(source.into()),
            sink: Some(sink),
        }
    }

    /// A forwarding logger together with the receiving end of its channel.
    pub fn channel(source: impl Into<String>) -> (Self, Receiver<LogEntry>) {
        let (sender, receiver) = unbounded();
        (Self::with_sink(source, sender), receiver)
    }

    /// A child handle sharing this logger's sink, with `suffix` appended to the source.
    pub fn scoped(&self, suffix: &str) -> Self {
        Self {
            source: Arc::from(format!("{}/{}", self.source, suffix)),
            sink: self.sink.clone(),
        }
    }

    /// Source name attached to every entry.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Emit `message` at `level` and forward it to the sink, if any.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        let source = &*self.source;

        match level {
            LogLevel::Error => tracing::error!(source, "{}", message),
            LogLevel::Warning => tracing::warn!(source, "{}", message),
            LogLevel::Info => tracing::info!(source, "{}", message),
            LogLevel::Verbose => tracing::debug!(source, "{}", message),
            LogLevel::Debug => tracing::trace!(source, "{}", message),
        }

        if let Some(sink) = &self.sink {
            // Dropped when the listener is gone or full
            let _ = sink.try_send(LogEntry {
                level,
                source: source.to_string(),
                message,
            });
        }
    }

    /// Log at [`LogLevel::Error`].
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Log at [`LogLevel::Warning`].
    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    /// Log at [`LogLevel::Info`].
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Log at [`LogLevel::Verbose`].
    pub fn verbose(&self, message: impl Into<String>) {
        self.log(LogLevel::Verbose, message);
    }

    /// Log at [`LogLevel::Debug`].
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }
}

impl Default for RobotLogger {
    fn default() -> Self {
        Self::new("machina")
    }
}

impl fmt::Debug for RobotLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobotLogger")
            .field("source", &self.source)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_receives_entries() {
        let (logger, receiver) = RobotLogger::channel("robot");
        logger.warning("careful");
        logger.scoped("issue").info("hello");

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.level, LogLevel::Warning);
        assert_eq!(first.source, "robot");
        assert_eq!(first.message, "careful");

        let second = receiver.try_recv().unwrap();
        assert_eq!(second.source, "robot/issue");
    }

    #[test]
    fn test_dropped_receiver_is_a_no_op() {
        let (logger, receiver) = RobotLogger::channel("robot");
        drop(receiver);
        logger.error("nobody is listening");
    }
}
