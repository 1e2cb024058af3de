//! Per-context log sinks.

use host_types::LogLevel;
use std::cell::RefCell;
use std::rc::Rc;

/// Destination of a context's log output
pub trait LogSink {
    /// Write one message at `level`.
    fn write(&self, level: LogLevel, message: &str);
}

/// Sink that forwards to `tracing`, tagging every line with the script name.
#[derive(Debug, Clone)]
pub struct TracingSink {
    script: String,
}

impl TracingSink {
    /// Sink for the script registered as `script`.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl LogSink for TracingSink {
    fn write(&self, level: LogLevel, message: &str) {
        let script = self.script.as_str();
        match level {
            LogLevel::Fatal | LogLevel::Error => tracing::error!(target: "script", script, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "script", script, "{}", message),
            LogLevel::Info | LogLevel::Status => tracing::info!(target: "script", script, "{}", message),
            LogLevel::Verbose | LogLevel::Debug => {
                tracing::debug!(target: "script", script, "{}", message)
            }
            LogLevel::Trace => tracing::trace!(target: "script", script, "{}", message),
        }
    }
}

/// Sink that keeps every message in memory
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    lines: Rc<RefCell<Vec<(LogLevel, String)>>>,
}

impl CaptureSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured messages in arrival order.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.borrow().clone()
    }

    /// Captured message texts at `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl LogSink for CaptureSink {
    fn write(&self, level: LogLevel, message: &str) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}
