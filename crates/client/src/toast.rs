//! Toast notifications: where normalized failures reach the user.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::normalize::extract_error_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: Option<String>,
    pub message: String,
}

/// Destination for toasts (a UI bridge, a log, a test buffer).
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ToastSink for TracingSink {
    fn show(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => tracing::error!(title = ?toast.title, "{}", toast.message),
            ToastKind::Warning => tracing::warn!(title = ?toast.title, "{}", toast.message),
            ToastKind::Success | ToastKind::Info => {
                tracing::info!(title = ?toast.title, "{}", toast.message)
            }
        }
    }
}

/// Sink that buffers toasts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered toast.
    pub fn drain(&self) -> Vec<Toast> {
        match self.toasts.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ToastSink for MemorySink {
    fn show(&self, toast: Toast) {
        match self.toasts.lock() {
            Ok(mut guard) => guard.push(toast),
            Err(poisoned) => poisoned.into_inner().push(toast),
        }
    }
}

/// Front door for raising toasts.
#[derive(Clone)]
pub struct Toaster {
    sink: Arc<dyn ToastSink>,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for Toaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toaster").finish_non_exhaustive()
    }
}

impl Toaster {
    pub fn new(sink: Arc<dyn ToastSink>) -> Self {
        Self { sink }
    }

    pub fn show(&self, kind: ToastKind, title: Option<&str>, message: impl Into<String>) {
        self.sink.show(Toast {
            kind,
            title: title.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(ToastKind::Success, None, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(ToastKind::Info, None, message);
    }

    /// Report a typed client error.
    pub fn error(&self, title: &str, err: &ClientError) {
        self.show(ToastKind::Error, Some(title), err.user_message());
    }

    /// Report an error of unknown shape.
    pub fn error_value(&self, title: &str, err: &Value) {
        self.show(ToastKind::Error, Some(title), extract_error_message(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_toasts_carry_normalized_message() {
        let sink = MemorySink::new();
        let toaster = Toaster::new(Arc::new(sink.clone()));

        toaster.error("Could not save risk", &ClientError::http(403, None));
        toaster.error_value("Could not load vendors", &Value::Null);
        toaster.success("Saved");

        let toasts = sink.drain();
        assert_eq!(toasts.len(), 3);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].title.as_deref(), Some("Could not save risk"));
        assert_eq!(
            toasts[0].message,
            "You do not have permission to perform this action."
        );
        assert_eq!(toasts[1].message, crate::FALLBACK_MESSAGE);
        assert_eq!(toasts[2].kind, ToastKind::Success);
        assert!(sink.drain().is_empty());

        toaster.error_value("x", &json!({ "message": "boom" }));
        assert_eq!(sink.drain()[0].message, "boom");
    }
}
