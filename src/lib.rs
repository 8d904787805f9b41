//! # kroki-render
//!
//! Render text diagrams (Mermaid, PlantUML, GraphViz, D2, and 18 other
//! grammars) to PNG, SVG or PDF through a [Kroki](https://kroki.io) server,
//! one batch of independent items at a time.
//!
//! ## Pipeline Overview
//!
//! ```text
//! item parameters
//!  │
//!  ├─ 1. Params     validate source, type, format, server, timeout
//!  ├─ 2. Server     public kroki.io or a custom root (trailing slash removed)
//!  ├─ 3. Request    POST {base}/{type}/{format}, text/plain body
//!  ├─ 4. Transport  one HTTP call, raw bytes, no retry
//!  ├─ 5. Normalize  bytes or text → canonical bytes + MIME type
//!  └─ 6. Encode     base64 attachment + metadata record
//! ```
//!
//! Each item yields exactly one [`ResultItem`] at its own position. A failing
//! item either becomes a failure record (continue-on-failure) or aborts the
//! batch with its index attached (fail-fast, the default).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kroki_render::{run_batch, BatchConfig, InputItem, RawParameters};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let items = vec![InputItem::new(
//!         0,
//!         RawParameters::new("mermaid", "svg", "graph TD; A-->B;"),
//!     )];
//!     let config = BatchConfig::builder().continue_on_fail(true).build()?;
//!     let outcome = run_batch(&items, &config).await?;
//!     for item in &outcome.items {
//!         println!("{}: success={}", item.index(), item.is_success());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `kroki` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! kroki-render = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod diagram;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{render_one, render_to_file, run_batch, run_batch_sync, write_outcome};
pub use config::{BatchConfig, BatchConfigBuilder};
pub use diagram::{mime_type_for, DiagramType, OutputFormat};
pub use error::{ErrorKind, ItemError, ItemFailure, KrokiError};
pub use output::{
    BatchOutcome, BatchStats, DebugInfo, FailureRecord, ResultItem, ResultRecord, SuccessRecord,
};
pub use pipeline::encode::BinaryAttachment;
pub use pipeline::input::{items_from_params, parse_items, read_items, InputItem, RawOptions, RawParameters};
pub use pipeline::server::{KrokiServer, PUBLIC_KROKI_URL};
pub use pipeline::transport::{KrokiTransport, RawBody, ReqwestTransport};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
