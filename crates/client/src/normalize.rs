//! Error normalization into user-facing messages.
//!
//! Resolution order, first hit wins:
//!
//! 1. JSON body of an HTTP error (`message`, joined with `", "` when it is an
//!    array, then `error`)
//! 2. transport failure (network, timeout)
//! 3. well-known HTTP status
//! 4. the transport error's own message
//! 5. a plain error message
//! 6. the value itself when it is a string
//! 7. [`FALLBACK_MESSAGE`]

use serde_json::Value;

use crate::error::{ClientError, TransportKind};

pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred. Please try again.";

const NETWORK_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";
const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";

fn status_message(status: u16) -> Option<&'static str> {
    let msg = match status {
        400 => "Invalid request. Please check your input and try again.",
        401 => "Your session has expired. Please log in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "This action conflicts with existing data. Please refresh and try again.",
        422 => "Validation failed. Please check your input.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 => "An internal server error occurred. Please try again later.",
        502 => "The server received an invalid response. Please try again later.",
        503 => "The service is temporarily unavailable. Please try again later.",
        504 => "The server took too long to respond. Please try again later.",
        _ => return None,
    };
    Some(msg)
}

/// Flattened view over any supported error shape.
#[derive(Debug, Default)]
struct ErrorView<'a> {
    body: Option<&'a Value>,
    transport: Option<TransportKind>,
    status: Option<u16>,
    transport_message: Option<&'a str>,
    plain_message: Option<String>,
    text: Option<&'a str>,
}

impl ErrorView<'_> {
    fn resolve(self) -> String {
        if let Some(msg) = self.body.and_then(body_message) {
            return msg;
        }
        match self.transport {
            Some(TransportKind::Network) => return NETWORK_MESSAGE.to_string(),
            Some(TransportKind::Timeout) => return TIMEOUT_MESSAGE.to_string(),
            None => {}
        }
        if let Some(msg) = self.status.and_then(status_message) {
            return msg.to_string();
        }
        if let Some(msg) = self.transport_message.filter(|m| !m.is_empty()) {
            return msg.to_string();
        }
        if let Some(msg) = self.plain_message.filter(|m| !m.is_empty()) {
            return msg;
        }
        if let Some(text) = self.text.filter(|t| !t.is_empty()) {
            return text.to_string();
        }
        FALLBACK_MESSAGE.to_string()
    }
}

fn body_message(body: &Value) -> Option<String> {
    match body.get("message") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if !parts.is_empty() {
                return Some(parts.join(", "));
            }
        }
        _ => {}
    }
    match body.get("error") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Normalize an untyped error value (as produced by an HTTP client binding or
/// read back from a serialized log) into a user-facing message.
///
/// `Value::Null` and unrecognized shapes yield [`FALLBACK_MESSAGE`].
pub fn extract_error_message(error: &Value) -> String {
    let view = match error {
        Value::String(s) => ErrorView {
            text: Some(s.as_str()),
            ..ErrorView::default()
        },
        Value::Object(obj) if obj.get("isAxiosError") == Some(&Value::Bool(true)) => {
            transport_view(error)
        }
        Value::Object(obj) => ErrorView {
            plain_message: obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..ErrorView::default()
        },
        _ => ErrorView::default(),
    };
    view.resolve()
}

fn transport_view(error: &Value) -> ErrorView<'_> {
    let response = error.get("response").filter(|r| !r.is_null());
    let code = error.get("code").and_then(Value::as_str);
    let message = error.get("message").and_then(Value::as_str);

    let body = response
        .and_then(|r| r.get("data"))
        .filter(|d| d.is_object());
    let status = response
        .and_then(|r| r.get("status"))
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok());

    let timed_out = matches!(code, Some("ECONNABORTED") | Some("ETIMEDOUT"))
        || message.is_some_and(|m| m.to_ascii_lowercase().contains("timeout"));
    let network = code == Some("ERR_NETWORK") || message == Some("Network Error");

    let transport = if timed_out {
        Some(TransportKind::Timeout)
    } else if network {
        Some(TransportKind::Network)
    } else {
        None
    };

    ErrorView {
        body,
        transport,
        status,
        transport_message: message,
        ..ErrorView::default()
    }
}

impl ClientError {
    /// User-facing message for a typed client error.
    pub fn user_message(&self) -> String {
        let view = match self {
            ClientError::Http {
                status,
                body,
                message,
            } => ErrorView {
                body: body.as_ref(),
                status: Some(*status),
                transport_message: Some(message.as_str()),
                ..ErrorView::default()
            },
            ClientError::Network(msg) => ErrorView {
                transport: Some(TransportKind::Network),
                transport_message: Some(msg.as_str()),
                ..ErrorView::default()
            },
            ClientError::Timeout(msg) => ErrorView {
                transport: Some(TransportKind::Timeout),
                transport_message: Some(msg.as_str()),
                ..ErrorView::default()
            },
            ClientError::Decode(_) | ClientError::Other(_) => ErrorView {
                plain_message: Some(self.to_string()),
                ..ErrorView::default()
            },
        };
        view.resolve()
    }
}
