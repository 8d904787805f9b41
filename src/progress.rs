//! Progress-callback trait for per-item batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! events as the batch renders each item.
//!
//! # Example
//!
//! ```rust
//! use kroki_render::{BatchConfig, BatchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rendered: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, encoded_len: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("item {}/{} rendered ({} bytes base64)", index + 1, total, encoded_len);
//!     }
//! }
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { rendered: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch runner as it processes each item.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` item events
/// arrive from concurrently running futures. All methods default to no-ops.
/// Indices are 0-based input positions.
///
/// Every batch ends with exactly one of [`on_batch_complete`] or
/// [`on_batch_aborted`], so a progress bar can always be torn down.
///
/// [`on_batch_complete`]: BatchProgressCallback::on_batch_complete
/// [`on_batch_aborted`]: BatchProgressCallback::on_batch_aborted
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first item starts.
    ///
    /// # Arguments
    /// * `total_items` — number of items in the batch
    fn on_batch_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called just before an item's parameters are resolved.
    ///
    /// # Arguments
    /// * `index`       — 0-based input position
    /// * `total_items` — number of items in the batch
    fn on_item_start(&self, index: usize, total_items: usize) {
        let _ = (index, total_items);
    }

    /// Called when an item rendered successfully.
    ///
    /// # Arguments
    /// * `index`       — 0-based input position
    /// * `total_items` — number of items in the batch
    /// * `encoded_len` — length of the base64 attachment
    ///   (roughly 4/3 of the rendered image size)
    fn on_item_complete(&self, index: usize, total_items: usize, encoded_len: usize) {
        let _ = (index, total_items, encoded_len);
    }

    /// Called when an item failed. There is no retry, so this is final.
    ///
    /// # Arguments
    /// * `index`       — 0-based input position
    /// * `total_items` — number of items in the batch
    /// * `error`       — human-readable error description
    fn on_item_error(&self, index: usize, total_items: usize, error: &str) {
        let _ = (index, total_items, error);
    }

    /// Called once after every item has produced a result.
    ///
    /// # Arguments
    /// * `total_items`   — number of items in the batch
    /// * `success_count` — items that rendered without error
    fn on_batch_complete(&self, total_items: usize, success_count: usize) {
        let _ = (total_items, success_count);
    }

    /// Called once when the batch returns an error after it started, instead
    /// of [`BatchProgressCallback::on_batch_complete`]. Usually a fail-fast
    /// stop at a failing item; in-flight items are cancelled and report no
    /// further events.
    ///
    /// # Arguments
    /// * `total_items` — number of items in the batch
    /// * `error`       — the error the batch returns
    fn on_batch_aborted(&self, total_items: usize, error: &str) {
        let _ = (total_items, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
