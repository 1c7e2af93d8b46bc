//! An optional diagnostic-message callback the engine accepts but does not
//! require, so a missing sink is always a cheap no-op rather than a branch
//! every call site has to account for. Cloning a `LogSink` shares the same
//! underlying callback (if any), so the registry can hand every counter it
//! constructs its own clone.

use std::sync::Arc;

type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub struct LogSink(Option<LogFn>);

impl LogSink {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(sink)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, message: &str) {
        if let Some(sink) = &self.0 {
            sink(message);
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::none()
    }
}
