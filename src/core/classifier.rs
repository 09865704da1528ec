//! Maps raised failures onto [`FailureClassification`].
//!
//! Pure and total: every input yields exactly one classification and nothing
//! is logged or mutated here.

use crate::utils::error::FailureClassification;
use std::error::Error as StdError;

/// A failure as raised at the network boundary, before classification.
#[derive(Debug)]
pub enum RaisedFailure<'a> {
    /// The timer side of the race settled first.
    Elapsed,
    /// Refused by the operating mode before any I/O.
    ShortCircuit,
    /// The transport raised an error.
    Transport(&'a reqwest::Error),
    /// The server answered outside the 2xx range.
    Status { status: u16, body: &'a str },
    /// A 2xx response whose body could not be understood.
    Malformed(String),
}

const UNREACHABLE_HINTS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection aborted",
    "network is unreachable",
    "no route to host",
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "tls",
    "certificate",
    "handshake",
];

const MAX_TEXT_MESSAGE_LEN: usize = 200;

pub fn classify(failure: RaisedFailure<'_>) -> FailureClassification {
    match failure {
        RaisedFailure::Elapsed => FailureClassification::Timeout,
        RaisedFailure::ShortCircuit => FailureClassification::DemoModeShortCircuit,
        RaisedFailure::Status { status, body } => classify_status(status, body),
        RaisedFailure::Malformed(cause) => FailureClassification::Unknown(cause),
        RaisedFailure::Transport(err) => classify_transport(err),
    }
}

fn classify_transport(err: &reqwest::Error) -> FailureClassification {
    if err.is_timeout() {
        return FailureClassification::Timeout;
    }
    if let Some(status) = err.status() {
        return FailureClassification::HttpError {
            status: status.as_u16(),
            message: None,
        };
    }
    if err.is_connect() || message_suggests_unreachable(&error_chain_text(err)) {
        return FailureClassification::NetworkUnreachable;
    }
    FailureClassification::Unknown(err.to_string())
}

pub fn classify_status(status: u16, body: &str) -> FailureClassification {
    if (200..300).contains(&status) {
        return FailureClassification::Unknown(format!(
            "status {} is not a failure",
            status
        ));
    }
    FailureClassification::HttpError {
        status,
        message: parse_server_message(body),
    }
}

fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

pub fn message_suggests_unreachable(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    UNREACHABLE_HINTS.iter().any(|hint| lowered.contains(hint))
}

/// Extracts a human-readable message from an error body.
///
/// Looks at `message`, then `error` (string or `{message}`), and finally the
/// raw text when it is short and not markup.
pub fn parse_server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let from_message = obj.get("message").and_then(|v| v.as_str());
        let from_error = obj.get("error").and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(inner) => inner.get("message").and_then(|m| m.as_str()),
            _ => None,
        });
        return from_message
            .or(from_error)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
    }

    if trimmed.starts_with('<') || trimmed.chars().count() > MAX_TEXT_MESSAGE_LEN {
        return None;
    }
    Some(trimmed.to_string())
}
