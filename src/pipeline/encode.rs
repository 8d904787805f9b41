//! Attachment encoding: canonical bytes → base64 [`BinaryAttachment`].
//!
//! Hosts store binaries as base64 strings next to their MIME type and a
//! suggested file name, so that is the shape produced here. Standard alphabet
//! with padding, which every consumer decodes.

use crate::error::ItemError;
use crate::pipeline::normalize::RenderedArtifact;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A storage-ready encoded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAttachment {
    /// Base64 of the rendered bytes.
    pub data: String,
    pub mime_type: String,
    pub file_name: String,
    pub file_extension: String,
}

impl BinaryAttachment {
    /// Decode the payload back to the rendered bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ItemError> {
        STANDARD.decode(&self.data).map_err(|e| ItemError::Encoding {
            detail: e.to_string(),
        })
    }
}

/// Base64-wrap a rendered artifact.
///
/// ## Why standard alphabet with padding?
/// Workflow hosts and browsers decode attachments with a plain base64
/// decoder. URL-safe or unpadded output is rejected by several of them.
///
/// # Errors
/// [`ItemError::Encoding`] only when the encoded length would not fit in
/// `usize`; in practice this never happens for a real diagram.
pub fn encode_artifact(artifact: &RenderedArtifact) -> Result<BinaryAttachment, ItemError> {
    if base64::encoded_len(artifact.bytes.len(), true).is_none() {
        return Err(ItemError::Encoding {
            detail: format!(
                "{} bytes exceed the largest encodable payload",
                artifact.bytes.len()
            ),
        });
    }

    let data = STANDARD.encode(&artifact.bytes);
    debug!(
        "Encoded {} → {} bytes base64",
        artifact.file_name,
        data.len()
    );

    Ok(BinaryAttachment {
        data,
        mime_type: artifact.mime_type.to_string(),
        file_name: artifact.file_name.clone(),
        file_extension: artifact.file_extension.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::OutputFormat;
    use crate::pipeline::normalize::normalize_response;
    use crate::pipeline::transport::RawBody;

    fn artifact(bytes: Vec<u8>, format: OutputFormat) -> RenderedArtifact {
        normalize_response(RawBody::Bytes(bytes), format).unwrap()
    }

    #[test]
    fn binary_payload_round_trips() {
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend((0u8..=255).collect::<Vec<_>>());
        let att = encode_artifact(&artifact(png.clone(), OutputFormat::Png)).unwrap();
        assert_eq!(att.decode().unwrap(), png);
        assert_eq!(att.mime_type, "image/png");
        assert_eq!(att.file_name, "diagram.png");
        assert_eq!(att.file_extension, "png");
    }

    #[test]
    fn text_payload_round_trips() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>ü</text></svg>";
        let art = normalize_response(
            RawBody::Text {
                body: svg.into(),
                charset: None,
            },
            OutputFormat::Svg,
        )
        .unwrap();
        let att = encode_artifact(&art).unwrap();
        assert_eq!(String::from_utf8(att.decode().unwrap()).unwrap(), svg);
        assert_eq!(att.file_name, "diagram.svg");
    }

    #[test]
    fn encoding_is_deterministic_and_padded() {
        let art = artifact(b"ab".to_vec(), OutputFormat::Pdf);
        assert_eq!(encode_artifact(&art).unwrap().data, "YWI=");
        assert_eq!(encode_artifact(&art).unwrap(), encode_artifact(&art).unwrap());
    }

    #[test]
    fn serialises_with_host_field_names() {
        let att = encode_artifact(&artifact(vec![1], OutputFormat::Png)).unwrap();
        let v = serde_json::to_value(&att).unwrap();
        assert_eq!(v["mimeType"], "image/png");
        assert_eq!(v["fileName"], "diagram.png");
        assert_eq!(v["fileExtension"], "png");
        assert_eq!(v["data"], "AQ==");
    }

    #[test]
    fn corrupt_payload_fails_to_decode() {
        let att = BinaryAttachment {
            data: "***".into(),
            mime_type: "image/png".into(),
            file_name: "diagram.png".into(),
            file_extension: "png".into(),
        };
        assert!(matches!(att.decode(), Err(ItemError::Encoding { .. })));
    }
}
