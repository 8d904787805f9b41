//! Input loading: turn a JSON item document into positional [`InputItem`]s.
//!
//! Hosts hand us one parameter bag per item, shaped exactly like the node
//! parameters a workflow editor would store (camelCase keys, nested
//! `options` collection). A document is either a single bag or an array of
//! them; each item's index is its position in that array.

use crate::error::KrokiError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Raw, unvalidated parameters for one item.
///
/// Field defaults match the defaults a host would apply for an untouched
/// parameter, so a document may omit anything except the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawParameters {
    pub diagram_type: String,
    pub output_format: String,
    pub diagram_source: String,
    pub kroki_server: String,
    pub custom_server_url: String,
    pub options: RawOptions,
}

impl Default for RawParameters {
    fn default() -> Self {
        Self {
            diagram_type: "mermaid".to_string(),
            output_format: "png".to_string(),
            diagram_source: String::new(),
            kroki_server: "public".to_string(),
            custom_server_url: String::new(),
            options: RawOptions::default(),
        }
    }
}

impl RawParameters {
    /// Parameters for a public-server render of `source`.
    pub fn new(
        diagram_type: impl Into<String>,
        output_format: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            diagram_type: diagram_type.into(),
            output_format: output_format.into(),
            diagram_source: source.into(),
            ..Self::default()
        }
    }

    /// Route this item to a self-hosted Kroki server.
    pub fn with_custom_server(mut self, url: impl Into<String>) -> Self {
        self.kroki_server = "custom".to_string();
        self.custom_server_url = url.into();
        self
    }

    /// Request timeout in milliseconds; `0` means the default and other
    /// values are clamped to `[1000, 300000]` during validation.
    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.options.timeout = Some(ms);
        self
    }

    /// Key the attachment is stored under (default `"data"`).
    pub fn with_binary_property_name(mut self, name: impl Into<String>) -> Self {
        self.options.binary_property_name = Some(name.into());
        self
    }
}

/// The optional `options` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOptions {
    /// Request timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Key under which the rendered attachment is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_property_name: Option<String>,
}

/// One positional item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    pub index: usize,
    pub params: RawParameters,
}

impl InputItem {
    /// `index` must equal the item's position in the batch slice;
    /// [`crate::run_batch`] rejects items where it does not.
    pub fn new(index: usize, params: RawParameters) -> Self {
        Self { index, params }
    }
}

/// Number every parameter bag by its position.
pub fn items_from_params(params: impl IntoIterator<Item = RawParameters>) -> Vec<InputItem> {
    params
        .into_iter()
        .enumerate()
        .map(|(index, params)| InputItem { index, params })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemDocument {
    Many(Vec<RawParameters>),
    One(RawParameters),
}

/// Parse a JSON document holding one parameter object or an array of them.
pub fn parse_items(json: &str) -> Result<Vec<InputItem>, KrokiError> {
    let doc: ItemDocument =
        serde_json::from_str(json).map_err(|e| KrokiError::InvalidInput {
            detail: e.to_string(),
        })?;

    let params = match doc {
        ItemDocument::Many(v) => v,
        ItemDocument::One(p) => vec![p],
    };
    debug!("Parsed {} input items", params.len());
    Ok(items_from_params(params))
}

/// Read and parse an item document from disk.
pub async fn read_items(path: impl AsRef<Path>) -> Result<Vec<InputItem>, KrokiError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KrokiError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            KrokiError::InvalidInput {
                detail: format!("{}: {}", path.display(), e),
            }
        }
    })?;
    parse_items(&json)
}
