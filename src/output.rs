//! Output types: per-item result records and the batch outcome.
//!
//! Every [`ResultItem`] serialises to the shape a workflow host stores for an
//! output item:
//!
//! ```json
//! {
//!   "json": { "diagramType": "mermaid", "outputFormat": "svg", "fileName": "diagram.svg",
//!             "mimeType": "image/svg+xml", "success": true },
//!   "binary": { "data": { "data": "PHN2Zz4=", "mimeType": "image/svg+xml", … } },
//!   "pairedItem": 0
//! }
//! ```

use crate::diagram::{DiagramType, OutputFormat};
use crate::error::{ErrorKind, ItemError};
use crate::pipeline::encode::BinaryAttachment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive metadata for a successfully rendered item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRecord {
    pub diagram_type: DiagramType,
    pub output_format: OutputFormat,
    pub file_name: String,
    pub mime_type: String,
    pub success: bool,
    /// Transport diagnostics, present only when the batch asked for them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Failure record for an item that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    /// Human-readable error message.
    pub error: String,
    pub error_kind: ErrorKind,
    pub success: bool,
}

impl From<&ItemError> for FailureRecord {
    fn from(e: &ItemError) -> Self {
        Self {
            error: e.to_string(),
            error_kind: e.kind(),
            success: false,
        }
    }
}

/// Either record variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Success(SuccessRecord),
    Failure(FailureRecord),
}

/// Optional diagnostics about the raw response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// How the transport delivered the body: bytes, text, …
    pub body_kind: String,
    pub body_length: usize,
    pub url: String,
    /// Length of the diagram source in characters.
    pub diagram_length: usize,
    /// First 16 body bytes, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_with_png: Option<bool>,
    /// First 100 characters of a textual body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_chars: Option<String>,
}

/// One output item, paired with the input item at the same position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub json: ResultRecord,
    /// Encoded artifact keyed by the item's binary property name; empty on failure.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryAttachment>,
    /// Index of the originating input item.
    pub paired_item: usize,
}

impl ResultItem {
    /// Successful item with its attachment stored under `property`.
    ///
    /// # Arguments
    /// * `index`      — input position the result is paired with
    /// * `record`     — descriptive metadata for the `json` side
    /// * `property`   — binary property name (`"data"` unless configured)
    /// * `attachment` — the encoded artifact
    pub fn success(
        index: usize,
        record: SuccessRecord,
        property: impl Into<String>,
        attachment: BinaryAttachment,
    ) -> Self {
        let mut binary = BTreeMap::new();
        binary.insert(property.into(), attachment);
        Self {
            json: ResultRecord::Success(record),
            binary,
            paired_item: index,
        }
    }

    /// Failed item: a failure record and no attachment.
    pub fn failure(index: usize, error: &ItemError) -> Self {
        Self {
            json: ResultRecord::Failure(FailureRecord::from(error)),
            binary: BTreeMap::new(),
            paired_item: index,
        }
    }

    /// Input position this result belongs to.
    pub fn index(&self) -> usize {
        self.paired_item
    }

    pub fn is_success(&self) -> bool {
        matches!(self.json, ResultRecord::Success(_))
    }

    /// Error message of a failed item.
    pub fn error(&self) -> Option<&str> {
        match &self.json {
            ResultRecord::Failure(f) => Some(&f.error),
            ResultRecord::Success(_) => None,
        }
    }

    /// The single attached artifact, if any.
    pub fn attachment(&self) -> Option<(&str, &BinaryAttachment)> {
        self.binary.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// Aggregate counters for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Ordered results of a batch run: `items[i]` belongs to input item `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub items: Vec<ResultItem>,
    pub stats: BatchStats,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Failed items, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &ResultItem> {
        self.items.iter().filter(|i| !i.is_success())
    }
}
