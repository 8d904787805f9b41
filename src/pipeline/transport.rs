//! Outbound transport: the only stage with network I/O.
//!
//! [`KrokiTransport`] is the seam between the pipeline and HTTP. The default
//! [`ReqwestTransport`] always reads the body as raw bytes; other transports
//! (or test doubles) may hand back text or something else entirely, which is
//! why the result is a [`RawBody`] rather than plain bytes.
//!
//! There is no retry here: a failed call surfaces exactly once.

use crate::error::{ItemError, KrokiError};
use crate::pipeline::request::RenderRequest;
use async_trait::async_trait;
use tracing::debug;

/// User-Agent sent by [`ReqwestTransport::new`].
pub const DEFAULT_USER_AGENT: &str = concat!("kroki-render/", env!("CARGO_PKG_VERSION"));

/// Longest service error text kept in [`ItemError::HttpStatus`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// A response body as delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    /// Undecoded bytes.
    Bytes(Vec<u8>),
    /// Body already decoded to text, with the charset the server reported.
    Text {
        body: String,
        charset: Option<String>,
    },
    /// Body parsed as JSON by the transport.
    Structured(serde_json::Value),
    /// No body at all.
    Absent,
}

impl RawBody {
    /// Short name of the body representation, for logs and debug records.
    pub fn kind(&self) -> &'static str {
        match self {
            RawBody::Bytes(_) => "bytes",
            RawBody::Text { .. } => "text",
            RawBody::Structured(_) => "structured",
            RawBody::Absent => "absent",
        }
    }

    /// Length in bytes (text is measured in its UTF-8 form).
    pub fn len(&self) -> usize {
        match self {
            RawBody::Bytes(b) => b.len(),
            RawBody::Text { body, .. } => body.len(),
            RawBody::Structured(_) | RawBody::Absent => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sends one render request and returns the raw response body.
///
/// Implement this to route requests through something other than `reqwest`
/// (a proxying client, a recorder, a test double) and inject it with
/// [`crate::BatchConfigBuilder::transport`].
#[async_trait]
pub trait KrokiTransport: Send + Sync {
    /// Perform exactly one call for `request`.
    ///
    /// # Errors
    /// A classified [`ItemError`]; transports never retry.
    async fn send(&self, request: &RenderRequest) -> Result<RawBody, ItemError>;
}

/// `reqwest`-backed transport with one shared connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with the default `kroki-render/<version>` User-Agent.
    ///
    /// # Errors
    /// [`KrokiError::Internal`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, KrokiError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Transport with a custom User-Agent.
    ///
    /// No client-wide timeout is set: every request carries its own.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, KrokiError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| KrokiError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (custom proxies, TLS roots, …).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KrokiTransport for ReqwestTransport {
    async fn send(&self, request: &RenderRequest) -> Result<RawBody, ItemError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!("POST {} ({} bytes source)", request.url, request.body.len());
        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ItemError::HttpStatus {
                url: request.url.clone(),
                status: status.as_u16(),
                body: body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        // Raw bytes, never `text()`: PNG and PDF must not pass a text decoder.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(e, request))?;
        debug!("{} → {} bytes", request.url, bytes.len());
        Ok(RawBody::Bytes(bytes.to_vec()))
    }
}

fn classify_error(e: reqwest::Error, request: &RenderRequest) -> ItemError {
    if e.is_timeout() {
        ItemError::Timeout {
            url: request.url.clone(),
            timeout_ms: request.timeout_ms(),
        }
    } else {
        ItemError::Transport {
            url: request.url.clone(),
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use reqwest::Method;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn render_request(url: String, timeout_ms: u64) -> RenderRequest {
        RenderRequest {
            method: Method::POST,
            url,
            headers: vec![("Content-Type".into(), "text/plain".into())],
            body: "graph TD; A-->B;".into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// One-shot HTTP server on an ephemeral port.
    ///
    /// Reads a single request (head plus `Content-Length` body), waits
    /// `delay`, then answers with `status` and `body`. The handle resolves to
    /// the raw request text as received.
    async fn stub_server(
        status: &'static str,
        body: Vec<u8>,
        delay: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];

            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending a full request head");
                received.extend_from_slice(&chunk[..n]);
                if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while received.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
            }

            tokio::time::sleep(delay).await;
            let mut response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            response.extend_from_slice(&body);
            // The client may already have given up (timeout case).
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&received).into_owned()
        });

        (base, handle)
    }

    #[test]
    fn body_kinds() {
        assert_eq!(RawBody::Bytes(vec![1, 2, 3]).kind(), "bytes");
        assert_eq!(RawBody::Bytes(vec![1, 2, 3]).len(), 3);
        let text = RawBody::Text {
            body: "<svg/>".into(),
            charset: None,
        };
        assert_eq!(text.kind(), "text");
        assert_eq!(text.len(), 6);
        assert!(RawBody::Absent.is_empty());
        assert_eq!(RawBody::Structured(serde_json::json!({})).kind(), "structured");
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(DEFAULT_USER_AGENT.starts_with("kroki-render/"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let transport = ReqwestTransport::new().unwrap();
        // Port 9 (discard) on localhost is closed on any sane test host.
        let request = RenderRequest {
            method: Method::POST,
            url: "http://127.0.0.1:9/mermaid/png".into(),
            headers: vec![("Content-Type".into(), "text/plain".into())],
            body: "graph TD; A-->B;".into(),
            timeout: Duration::from_millis(2000),
        };
        let err = transport.send(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }

    #[tokio::test]
    async fn non_utf8_bytes_arrive_unaltered() {
        let png = vec![0x89, b'P', b'N', b'G', 0xFF, 0xFE, 0x00, 0x80];
        let (base, server) = stub_server("200 OK", png.clone(), Duration::ZERO).await;

        let transport = ReqwestTransport::new().unwrap();
        let body = transport
            .send(&render_request(format!("{base}/mermaid/png"), 5_000))
            .await
            .unwrap();
        assert_eq!(body, RawBody::Bytes(png));

        let seen = server.await.unwrap();
        let lower = seen.to_ascii_lowercase();
        assert!(seen.starts_with("POST /mermaid/png "), "got: {seen}");
        assert!(lower.contains("content-type: text/plain"), "got: {seen}");
        assert!(lower.contains("user-agent: kroki-render/"), "got: {seen}");
        assert!(seen.ends_with("graph TD; A-->B;"), "got: {seen}");
    }

    #[tokio::test]
    async fn error_status_carries_service_text() {
        let (base, _server) =
            stub_server("400 Bad Request", b"Syntax Error\n".to_vec(), Duration::ZERO).await;

        let transport = ReqwestTransport::new().unwrap();
        let url = format!("{base}/plantuml/svg");
        let err = transport
            .send(&render_request(url.clone(), 5_000))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ItemError::HttpStatus {
                url,
                status: 400,
                body: "Syntax Error".into(),
            }
        );
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[tokio::test]
    async fn long_error_body_is_truncated() {
        let (base, _server) =
            stub_server("500 Internal Server Error", vec![b'x'; 2_000], Duration::ZERO).await;

        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .send(&render_request(format!("{base}/d2/svg"), 5_000))
            .await
            .unwrap_err();
        match err {
            ItemError::HttpStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_server_is_a_timeout() {
        let (base, _server) =
            stub_server("200 OK", b"late".to_vec(), Duration::from_secs(3)).await;

        let transport = ReqwestTransport::new().unwrap();
        let url = format!("{base}/graphviz/png");
        let err = transport
            .send(&render_request(url.clone(), 1_000))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ItemError::Timeout {
                url,
                timeout_ms: 1_000,
            }
        );
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }
}
