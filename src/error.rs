//! Error types for the kroki-render library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`KrokiError`] — **Fatal**: the run cannot proceed or was configured to
//!   stop at the first failing item (unreadable item file, bad config,
//!   fail-fast batch). Returned as `Err(KrokiError)` from the top-level
//!   `run_batch*` / `render_*` functions.
//!
//! * [`ItemError`] — **Non-fatal**: a single item failed (empty source,
//!   unreachable server, timeout) but every other item is unaffected. In
//!   continue-on-failure mode it is recorded inside
//!   [`crate::output::ResultItem`] at the item's position.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the kroki-render library.
#[derive(Debug, Error)]
pub enum KrokiError {
    // ── Batch errors ──────────────────────────────────────────────────────
    /// An item failed while the batch was running in fail-fast mode.
    #[error("Item {index} failed: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: ItemError,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Item file was not found at the given path.
    #[error("Item file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The item document could not be parsed.
    #[error("Invalid item input: {detail}")]
    InvalidInput { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a rendered diagram file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KrokiError {
    /// Index of the failing item, when the error came from one.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            KrokiError::ItemFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// A non-fatal error for a single item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    /// A parameter was missing or malformed.
    #[error("{message}")]
    Validation { message: String },

    /// The request could not be sent or the connection broke.
    #[error("Request to '{url}' failed: {detail}")]
    Transport { url: String, detail: String },

    /// The request exceeded its configured timeout.
    #[error("Request to '{url}' timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The rendering service answered with a non-success status.
    #[error("Kroki server returned HTTP {status} for '{url}': {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was neither bytes nor text.
    #[error("Unexpected response type: {kind}")]
    UnexpectedResponseType { kind: String },

    /// Base64 encoding of the rendered bytes failed.
    #[error("Failed to encode rendered diagram: {detail}")]
    Encoding { detail: String },
}

impl ItemError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ItemError::Validation {
            message: message.into(),
        }
    }

    /// Classify this error into one of the four reported kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ItemError::Validation { .. } => ErrorKind::ValidationError,
            ItemError::Transport { .. }
            | ItemError::Timeout { .. }
            | ItemError::HttpStatus { .. } => ErrorKind::TransportError,
            ItemError::UnexpectedResponseType { .. } => ErrorKind::UnexpectedResponseTypeError,
            ItemError::Encoding { .. } => ErrorKind::EncodingError,
        }
    }
}

/// Classification attached to every failure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    TransportError,
    UnexpectedResponseTypeError,
    EncodingError,
}

/// An [`ItemError`] tagged with the position of the item that raised it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Item {index}: {error}")]
pub struct ItemFailure {
    pub index: usize,
    #[source]
    pub error: ItemError,
}

impl From<ItemFailure> for KrokiError {
    fn from(f: ItemFailure) -> Self {
        KrokiError::ItemFailed {
            index: f.index,
            source: f.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_failed_display_mentions_index() {
        let e: KrokiError = ItemFailure {
            index: 3,
            error: ItemError::validation("Diagram source is required"),
        }
        .into();
        let msg = e.to_string();
        assert!(msg.contains("Item 3"), "got: {msg}");
        assert!(msg.contains("Diagram source is required"), "got: {msg}");
        assert_eq!(e.item_index(), Some(3));
    }

    #[test]
    fn transport_family_classifies_together() {
        let t = ItemError::Transport {
            url: "https://kroki.io/mermaid/png".into(),
            detail: "connection refused".into(),
        };
        let to = ItemError::Timeout {
            url: "https://kroki.io/mermaid/png".into(),
            timeout_ms: 1000,
        };
        let st = ItemError::HttpStatus {
            url: "https://kroki.io/mermaid/png".into(),
            status: 400,
            body: "Syntax error".into(),
        };
        assert_eq!(t.kind(), ErrorKind::TransportError);
        assert_eq!(to.kind(), ErrorKind::TransportError);
        assert_eq!(st.kind(), ErrorKind::TransportError);
    }

    #[test]
    fn timeout_display() {
        let e = ItemError::Timeout {
            url: "https://kroki.io/d2/svg".into(),
            timeout_ms: 5000,
        };
        assert!(e.to_string().contains("5000ms"));
    }

    #[test]
    fn http_status_display_carries_service_text() {
        let e = ItemError::HttpStatus {
            url: "https://kroki.io/plantuml/png".into(),
            status: 400,
            body: "Error 400: Syntax Error?".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 400"));
        assert!(msg.contains("Syntax Error?"));
    }

    #[test]
    fn non_item_errors_have_no_index() {
        assert_eq!(KrokiError::InvalidConfig("x".into()).item_index(), None);
    }
}
