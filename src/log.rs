//! Injected logging sink.
//!
//! The engine never logs through global state. Every machine carries a
//! [`LogSink`]; the default [`NullSink`] drops everything, and
//! [`TracingSink`] forwards to the `tracing` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Severity of a log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Destination for leveled text messages.
///
/// Sinks only observe. Swapping one sink for another must never change how
/// a machine behaves.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Shared handle to a sink, as stored by machines and states.
pub type SharedSink = Arc<dyn LogSink>;

/// Sink that discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Sink that forwards messages to `tracing`.
///
/// `tracing` has no critical level, so critical messages are emitted at
/// `error` with `critical = true`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!("{}", message),
            Level::Info => tracing::info!("{}", message),
            Level::Warning => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
            Level::Critical => tracing::error!(critical = true, "{}", message),
        }
    }
}

impl<F> LogSink for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        self(level, message)
    }
}

pub(crate) fn null_sink() -> SharedSink {
    Arc::new(NullSink)
}
