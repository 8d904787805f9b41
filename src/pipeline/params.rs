//! Parameter resolution: validate one item's raw parameters.
//!
//! Validation order matters for the message a user sees when several things
//! are wrong at once: the diagram source is checked first, then the custom
//! server URL's presence, then its shape.

use crate::diagram::{DiagramType, OutputFormat};
use crate::error::ItemError;
use crate::pipeline::input::RawParameters;
use crate::pipeline::server::{resolve_base_url, KrokiServer};
use once_cell::sync::Lazy;
use regex::Regex;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Smallest accepted request timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 1_000;
/// Largest accepted request timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 300_000;
/// Default attachment key.
pub const DEFAULT_BINARY_PROPERTY: &str = "data";

static HTTP_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+").unwrap());

/// Fully validated parameters for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    pub diagram_type: DiagramType,
    pub output_format: OutputFormat,
    /// Diagram source, never empty or whitespace-only.
    pub source: String,
    pub server: KrokiServer,
    /// Effective service root, without trailing slash.
    pub server_base_url: String,
    /// Request timeout, within `[MIN_TIMEOUT_MS, MAX_TIMEOUT_MS]`.
    pub timeout_ms: u64,
    pub binary_property_name: String,
}

/// Validate raw parameters and resolve the server they target.
///
/// # Errors
/// [`ItemError::Validation`] with the first problem found, in this order:
/// blank source, unknown diagram type, unknown output format, unknown server
/// option, missing custom URL, custom URL not matching `^https?://.+`.
pub fn resolve_parameters(raw: &RawParameters) -> Result<ResolvedParameters, ItemError> {
    if raw.diagram_source.trim().is_empty() {
        return Err(ItemError::validation("Diagram source is required"));
    }

    let diagram_type: DiagramType = raw.diagram_type.parse().map_err(ItemError::validation)?;
    let output_format: OutputFormat = raw.output_format.parse().map_err(ItemError::validation)?;
    let server: KrokiServer = raw.kroki_server.parse()?;

    // The URL is checked exactly as supplied; surrounding whitespace is not
    // forgiven.
    if server == KrokiServer::Custom {
        let url = raw.custom_server_url.as_str();
        if url.is_empty() {
            return Err(ItemError::validation(
                "Custom server URL is required when using custom server option",
            ));
        }
        if !HTTP_URL.is_match(url) {
            return Err(ItemError::validation(format!(
                "Invalid custom server URL format: '{url}'"
            )));
        }
    }

    let binary_property_name = match raw.options.binary_property_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => DEFAULT_BINARY_PROPERTY.to_string(),
    };

    Ok(ResolvedParameters {
        diagram_type,
        output_format,
        source: raw.diagram_source.clone(),
        server,
        server_base_url: resolve_base_url(server, &raw.custom_server_url),
        timeout_ms: clamp_timeout(raw.options.timeout),
        binary_property_name,
    })
}

/// Missing or zero means the default; anything else is clamped.
pub fn clamp_timeout(timeout: Option<u64>) -> u64 {
    match timeout {
        None | Some(0) => DEFAULT_TIMEOUT_MS,
        Some(ms) => ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mermaid(source: &str) -> RawParameters {
        RawParameters::new("mermaid", "svg", source)
    }

    #[test]
    fn public_defaults() {
        let r = resolve_parameters(&mermaid("graph TD; A-->B;")).unwrap();
        assert_eq!(r.diagram_type, DiagramType::Mermaid);
        assert_eq!(r.output_format, OutputFormat::Svg);
        assert_eq!(r.server_base_url, "https://kroki.io");
        assert_eq!(r.timeout_ms, 30_000);
        assert_eq!(r.binary_property_name, "data");
    }

    #[test]
    fn empty_or_blank_source_fails_for_any_server() {
        for source in ["", "   ", "\n\t "] {
            let public = resolve_parameters(&mermaid(source)).unwrap_err();
            assert_eq!(public.to_string(), "Diagram source is required");

            let custom = resolve_parameters(
                &mermaid(source).with_custom_server("https://example.com"),
            )
            .unwrap_err();
            assert_eq!(custom.to_string(), "Diagram source is required");
        }
    }

    #[test]
    fn custom_server_requires_url() {
        let err = resolve_parameters(&mermaid("a").with_custom_server("")).unwrap_err();
        assert!(matches!(err, ItemError::Validation { .. }));
        assert!(err.to_string().contains("Custom server URL is required"));
    }

    #[test]
    fn custom_server_rejects_malformed_url() {
        for url in ["not-a-url", "ftp://example.com", "https://", "example.com"] {
            let err = resolve_parameters(&mermaid("a").with_custom_server(url)).unwrap_err();
            assert!(
                err.to_string().contains("Invalid custom server URL"),
                "{url}: {err}"
            );
        }
    }

    #[test]
    fn custom_url_is_validated_as_supplied() {
        for url in [" https://example.com/", "\thttps://example.com", " "] {
            let err = resolve_parameters(&mermaid("a").with_custom_server(url)).unwrap_err();
            assert!(
                err.to_string().contains("Invalid custom server URL"),
                "{url:?}: {err}"
            );
        }
    }

    #[test]
    fn custom_server_strips_trailing_slash() {
        let r = resolve_parameters(&mermaid("a").with_custom_server("https://example.com/"))
            .unwrap();
        assert_eq!(r.server, KrokiServer::Custom);
        assert_eq!(r.server_base_url, "https://example.com");
    }

    #[test]
    fn custom_url_is_ignored_for_public() {
        let mut raw = mermaid("a");
        raw.custom_server_url = "not-a-url".into();
        let r = resolve_parameters(&raw).unwrap();
        assert_eq!(r.server_base_url, "https://kroki.io");
    }

    #[test]
    fn unknown_enums_fail_validation() {
        let err = resolve_parameters(&RawParameters::new("flowchart", "png", "a")).unwrap_err();
        assert!(matches!(err, ItemError::Validation { .. }));
        let err = resolve_parameters(&RawParameters::new("mermaid", "gif", "a")).unwrap_err();
        assert!(matches!(err, ItemError::Validation { .. }));
        let mut raw = mermaid("a");
        raw.kroki_server = "private".into();
        assert!(resolve_parameters(&raw).is_err());
    }

    #[test]
    fn timeout_clamping() {
        assert_eq!(clamp_timeout(None), 30_000);
        assert_eq!(clamp_timeout(Some(0)), 30_000);
        assert_eq!(clamp_timeout(Some(10)), 1_000);
        assert_eq!(clamp_timeout(Some(45_000)), 45_000);
        assert_eq!(clamp_timeout(Some(10_000_000)), 300_000);
    }

    #[test]
    fn blank_binary_property_falls_back() {
        let r = resolve_parameters(&mermaid("a").with_binary_property_name("  ")).unwrap();
        assert_eq!(r.binary_property_name, "data");
        let r = resolve_parameters(&mermaid("a").with_binary_property_name("image")).unwrap();
        assert_eq!(r.binary_property_name, "image");
    }
}
