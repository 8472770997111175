use tracing::Level;

/// Receiver for advisory diagnostic lines. Never affects control flow.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, line: &str);
}

/// Forwards lines to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, line: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "psetdoc", "{}", line),
            Level::WARN => tracing::warn!(target: "psetdoc", "{}", line),
            Level::INFO => tracing::info!(target: "psetdoc", "{}", line),
            Level::DEBUG => tracing::debug!(target: "psetdoc", "{}", line),
            _ => tracing::trace!(target: "psetdoc", "{}", line),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: Level, _line: &str) {}
}
