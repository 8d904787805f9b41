//! Response normalisation: raw transport body → canonical bytes + MIME type.
//!
//! The default transport already yields bytes, so most responses pass
//! straight through. Text bodies (from transports that decode for us) are
//! turned back into bytes using the charset the server reported; SVG is
//! UTF-8 XML, so that is the fallback.

use crate::diagram::OutputFormat;
use crate::error::ItemError;
use crate::pipeline::transport::RawBody;
use tracing::{debug, warn};

/// A rendered diagram in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
    pub file_extension: &'static str,
}

/// Turn whatever the transport returned into a [`RenderedArtifact`].
///
/// The MIME type depends only on the requested format, never on the body.
pub fn normalize_response(
    body: RawBody,
    format: OutputFormat,
) -> Result<RenderedArtifact, ItemError> {
    let bytes = match body {
        RawBody::Bytes(bytes) => bytes,
        RawBody::Text { body, charset } => {
            if !format.is_textual() {
                warn!(
                    "{} response arrived as text; bytes may have been altered by decoding",
                    format
                );
            }
            encode_text(body, charset.as_deref())
        }
        other => {
            return Err(ItemError::UnexpectedResponseType {
                kind: other.kind().to_string(),
            })
        }
    };

    Ok(RenderedArtifact {
        bytes,
        mime_type: format.mime_type(),
        file_name: format.file_name(),
        file_extension: format.as_str(),
    })
}

/// Re-encode decoded text with the reported charset.
///
/// Single-byte charsets are honoured only when every character fits; anything
/// else is written as UTF-8.
fn encode_text(text: String, charset: Option<&str>) -> Vec<u8> {
    let limit = match charset.map(|c| c.trim().to_ascii_lowercase()) {
        None => return text.into_bytes(),
        Some(c) if c == "utf-8" || c == "utf8" => return text.into_bytes(),
        Some(c) if matches!(c.as_str(), "iso-8859-1" | "latin1" | "latin-1") => 0xFF,
        Some(c) if matches!(c.as_str(), "us-ascii" | "ascii") => 0x7F,
        Some(c) => {
            debug!("Unknown response charset '{}', using UTF-8", c);
            return text.into_bytes();
        }
    };

    if text.chars().all(|ch| (ch as u32) <= limit) {
        text.chars().map(|ch| ch as u8).collect()
    } else {
        text.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn bytes_pass_through() {
        let art = normalize_response(RawBody::Bytes(PNG_MAGIC.to_vec()), OutputFormat::Png).unwrap();
        assert_eq!(art.bytes, PNG_MAGIC);
        assert_eq!(art.mime_type, "image/png");
        assert_eq!(art.file_name, "diagram.png");
        assert_eq!(art.file_extension, "png");
    }

    #[test]
    fn svg_text_becomes_utf8() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>Größe →</text></svg>";
        let body = RawBody::Text {
            body: svg.to_string(),
            charset: Some("UTF-8".into()),
        };
        let art = normalize_response(body, OutputFormat::Svg).unwrap();
        assert_eq!(art.bytes, svg.as_bytes());
        assert_eq!(art.mime_type, "image/svg+xml");
        assert_eq!(art.file_name, "diagram.svg");
    }

    #[test]
    fn latin1_charset_is_honoured_when_it_fits() {
        let body = RawBody::Text {
            body: "é".to_string(),
            charset: Some("ISO-8859-1".into()),
        };
        let art = normalize_response(body, OutputFormat::Svg).unwrap();
        assert_eq!(art.bytes, vec![0xE9]);
    }

    #[test]
    fn single_byte_charset_falls_back_to_utf8() {
        let body = RawBody::Text {
            body: "→".to_string(),
            charset: Some("us-ascii".into()),
        };
        let art = normalize_response(body, OutputFormat::Svg).unwrap();
        assert_eq!(art.bytes, "→".as_bytes());
    }

    #[test]
    fn absent_and_structured_are_unexpected() {
        let err = normalize_response(RawBody::Absent, OutputFormat::Png).unwrap_err();
        assert!(matches!(err, ItemError::UnexpectedResponseType { ref kind } if kind == "absent"));

        let err = normalize_response(
            RawBody::Structured(serde_json::json!({"error": "nope"})),
            OutputFormat::Pdf,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected response type: structured");
    }

    #[test]
    fn empty_bytes_are_still_bytes() {
        let art = normalize_response(RawBody::Bytes(Vec::new()), OutputFormat::Pdf).unwrap();
        assert!(art.bytes.is_empty());
        assert_eq!(art.mime_type, "application/pdf");
    }
}
