//! Non-fatal notices raised while dispatching diagnostics
//!
//! The dispatcher never writes to a stream directly; it hands notices to
//! an injected sink. The default sink forwards them to `tracing`.

/// Receiver for deprecation notices
pub trait NoticeSink {
    fn deprecated(&self, operation: &str, replacement: &str);
}

/// Emits notices as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn deprecated(&self, operation: &str, replacement: &str) {
        tracing::warn!(
            operation,
            replacement,
            "DEPRECATED. Please use {} instead",
            replacement
        );
    }
}

impl<T: NoticeSink + ?Sized> NoticeSink for &T {
    fn deprecated(&self, operation: &str, replacement: &str) {
        (**self).deprecated(operation, replacement)
    }
}

/// Collects notices in memory
#[derive(Debug, Default)]
pub struct RecordedNotices {
    notices: std::sync::Mutex<Vec<String>>,
}

impl RecordedNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<String> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl NoticeSink for RecordedNotices {
    fn deprecated(&self, operation: &str, replacement: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(format!("{} is deprecated; use {}", operation, replacement));
        }
    }
}
