//! Configuration for a batch run.
//!
//! Per-item knobs (diagram type, server, timeout, …) travel with each item's
//! parameters. [`BatchConfig`] only holds what applies to the whole run: the
//! failure policy, how many requests may be in flight, and the injectable
//! transport and progress callback.

use crate::error::KrokiError;
use crate::pipeline::transport::{KrokiTransport, DEFAULT_USER_AGENT};
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Largest accepted worker-pool size.
pub const MAX_CONCURRENCY: usize = 64;

/// Batch-level configuration.
///
/// # Example
/// ```rust
/// use kroki_render::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .continue_on_fail(true)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert!(config.continue_on_fail);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Record per-item failures in place instead of aborting. Default: false.
    pub continue_on_fail: bool,

    /// Maximum render requests in flight. Default: 1 (strictly sequential).
    ///
    /// Output order does not depend on this value.
    pub concurrency: usize,

    /// Attach transport diagnostics to success records. Default: false.
    pub include_debug: bool,

    /// User-Agent for the default transport.
    pub user_agent: String,

    /// Pre-constructed transport. When `None` a [`crate::ReqwestTransport`]
    /// is built for the run.
    pub transport: Option<Arc<dyn KrokiTransport>>,

    /// Optional per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            continue_on_fail: false,
            concurrency: 1,
            include_debug: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            transport: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("continue_on_fail", &self.continue_on_fail)
            .field("concurrency", &self.concurrency)
            .field("include_debug", &self.include_debug)
            .field("user_agent", &self.user_agent)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn KrokiTransport>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Start from the defaults: fail-fast, sequential, no debug records.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn continue_on_fail(mut self, v: bool) -> Self {
        self.config.continue_on_fail = v;
        self
    }

    /// Maximum requests in flight, `1..=MAX_CONCURRENCY`.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn include_debug(mut self, v: bool) -> Self {
        self.config.include_debug = v;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Use `transport` instead of building a [`crate::ReqwestTransport`].
    /// `user_agent` is then ignored.
    pub fn transport(mut self, transport: Arc<dyn KrokiTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, KrokiError> {
        let c = &self.config;
        if c.concurrency == 0 || c.concurrency > MAX_CONCURRENCY {
            return Err(KrokiError::InvalidConfig(format!(
                "Concurrency must be 1–{MAX_CONCURRENCY}, got {}",
                c.concurrency
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(KrokiError::InvalidConfig("User-Agent must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_fail_fast() {
        let c = BatchConfig::default();
        assert!(!c.continue_on_fail);
        assert_eq!(c.concurrency, 1);
        assert!(!c.include_debug);
        assert!(c.transport.is_none());
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        let err = BatchConfig::builder().concurrency(0).build().unwrap_err();
        assert!(err.to_string().contains("Concurrency"));
        assert!(BatchConfig::builder().concurrency(65).build().is_err());
        assert!(BatchConfig::builder().concurrency(64).build().is_ok());
    }

    #[test]
    fn builder_rejects_blank_user_agent() {
        assert!(BatchConfig::builder().user_agent(" ").build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = BatchConfig::builder()
            .progress_callback(Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let s = format!("{c:?}");
        assert!(s.contains("<dyn BatchProgressCallback>"));
    }
}
