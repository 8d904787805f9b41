//! Request construction: resolved parameters → outbound render request.

use crate::pipeline::params::ResolvedParameters;
use reqwest::Method;
use std::time::Duration;

/// A fully described render call, independent of the transport that sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub method: Method,
    /// `{base}/{diagramType}/{outputFormat}`.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Diagram source, sent unmodified.
    pub body: String,
    pub timeout: Duration,
}

impl RenderRequest {
    /// Timeout in whole milliseconds, as reported in [`crate::ItemError::Timeout`].
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Value of the first header named `name`, compared case-insensitively
    /// as HTTP header names are.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Render endpoint for an item: `{base}/{diagramType}/{outputFormat}`.
///
/// `server_base_url` never ends in `/` once resolved, so the join has exactly
/// one slash between segments.
pub fn render_url(params: &ResolvedParameters) -> String {
    format!(
        "{}/{}/{}",
        params.server_base_url, params.diagram_type, params.output_format
    )
}

/// Build the POST request for one item.
///
/// ## Why `text/plain`?
/// Kroki's POST endpoint takes the diagram source as the raw body. Sending it
/// as plain text avoids the JSON envelope and any escaping of the source.
pub fn build_request(params: &ResolvedParameters) -> RenderRequest {
    RenderRequest {
        method: Method::POST,
        url: render_url(params),
        headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        body: params.source.clone(),
        timeout: Duration::from_millis(params.timeout_ms),
    }
}
