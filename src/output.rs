// src/output.rs

//! Verbose output sinks for the selectors
//!
//! The selectors narrate what they are doing ("...checking limits for 812
//! ebuild sources") through an [`OutputSink`]. Implementations:
//! - `SilentOutput`: No-op for quiet mode and library use
//! - `LogOutput`: Forwards messages to tracing at info level
//! - `CallbackOutput`: Calls a user-provided closure
//! - `CollectOutput`: Records messages in memory

use std::sync::Mutex;
use tracing::info;

/// Receiver for verbose progress messages
pub trait OutputSink {
    /// Emit a single progress message
    fn message(&self, message: &str);
}

/// Silent output sink (no-op)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl OutputSink for SilentOutput {
    fn message(&self, _message: &str) {}
}

/// Output sink that logs every message through tracing
#[derive(Debug)]
pub struct LogOutput {
    name: String,
}

impl LogOutput {
    /// Create a logging sink; `name` prefixes every line
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl OutputSink for LogOutput {
    fn message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }
}

/// Callback-based output sink
pub struct CallbackOutput<F>
where
    F: Fn(&str),
{
    callback: F,
}

impl<F> CallbackOutput<F>
where
    F: Fn(&str),
{
    /// Create a sink that hands each message to `callback`
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> OutputSink for CallbackOutput<F>
where
    F: Fn(&str),
{
    fn message(&self, message: &str) {
        (self.callback)(message);
    }
}

impl<F> std::fmt::Debug for CallbackOutput<F>
where
    F: Fn(&str),
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackOutput").finish_non_exhaustive()
    }
}

/// Output sink that keeps every message
#[derive(Debug, Default)]
pub struct CollectOutput {
    messages: Mutex<Vec<String>>,
}

impl CollectOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, in order
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl OutputSink for CollectOutput {
    fn message(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_silent_output_accepts_messages() {
        let sink = SilentOutput;
        sink.message("nothing happens");
    }

    #[test]
    fn test_callback_output() {
        let seen = RefCell::new(Vec::new());
        let sink = CallbackOutput::new(|m: &str| seen.borrow_mut().push(m.to_string()));
        sink.message("one");
        sink.message("two");
        assert_eq!(*seen.borrow(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_collect_output_keeps_order() {
        let sink = CollectOutput::new();
        sink.message("a");
        sink.message("b");
        assert_eq!(sink.messages(), vec!["a", "b"]);
    }
}
