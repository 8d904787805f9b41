//! Batch entry points.
//!
//! [`run_batch`] renders every item and returns one [`ResultItem`] per input
//! item, in input order. What a failing item does to the run depends on
//! [`BatchConfig::continue_on_fail`]:
//!
//! * **continue** — the failure is recorded at the item's position and the
//!   batch keeps going; the outcome always has one entry per input.
//! * **fail-fast** — the earliest failure (by input position) is returned as
//!   [`KrokiError::ItemFailed`]. Items not yet started are never started;
//!   with `concurrency > 1`, later items already in flight are cancelled and
//!   their results discarded.
//!
//! With `concurrency > 1` several requests are in flight at once. Results are
//! written back by position, so ordering never depends on completion order.
//! Every [`InputItem::index`] must equal the item's position in the slice;
//! that index is what each result is paired with.

use crate::config::BatchConfig;
use crate::error::{ItemFailure, KrokiError};
use crate::output::{BatchOutcome, BatchStats, ResultItem};
use crate::pipeline::input::{InputItem, RawParameters};
use crate::pipeline::item;
use crate::pipeline::transport::{KrokiTransport, ReqwestTransport};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Render a batch of items.
///
/// # Arguments
/// * `items`  — items in input order; `items[i].index` must be `i`
/// * `config` — failure policy, concurrency, transport and progress callback
///
/// # Returns
/// One [`ResultItem`] per input item, at the same position.
///
/// # Errors
/// - [`KrokiError::InvalidInput`] when an item's index differs from its
///   position (checked before any request is sent)
/// - [`KrokiError::ItemFailed`] in fail-fast mode, for the first failing item
///   by input position; the progress callback sees `on_batch_aborted`
/// - setup errors such as an HTTP client that could not be built
pub async fn run_batch(
    items: &[InputItem],
    config: &BatchConfig,
) -> Result<BatchOutcome, KrokiError> {
    let start = Instant::now();
    let total = items.len();
    info!(
        "Starting batch: {} items, concurrency {}, continue_on_fail={}",
        total, config.concurrency, config.continue_on_fail
    );

    check_positions(items)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }
    if items.is_empty() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(0, 0);
        }
        return Ok(BatchOutcome::default());
    }

    let results = match collect(items, config).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Batch aborted: {}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_batch_aborted(total, &e.to_string());
            }
            return Err(e);
        }
    };

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    let stats = BatchStats {
        total_items: total,
        succeeded,
        failed: total - succeeded,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} items rendered, {}ms",
        succeeded, total, stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    Ok(BatchOutcome {
        items: results,
        stats,
    })
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally; do not call from within an
/// async context.
pub fn run_batch_sync(
    items: &[InputItem],
    config: &BatchConfig,
) -> Result<BatchOutcome, KrokiError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| KrokiError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(items, config))
}

/// Render a single diagram; any failure is returned as an error.
///
/// The item is processed at index 0, so a failure surfaces as
/// `KrokiError::ItemFailed { index: 0, .. }`.
pub async fn render_one(
    params: RawParameters,
    config: &BatchConfig,
) -> Result<ResultItem, KrokiError> {
    let transport = resolve_transport(config)?;
    let item = InputItem::new(0, params);
    let result = item::process_item(&transport, &item, config.include_debug).await?;
    Ok(result)
}

/// Render a single diagram and write the decoded image to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files. Returns
/// the number of bytes written.
pub async fn render_to_file(
    params: RawParameters,
    output_path: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<usize, KrokiError> {
    let result = render_one(params, config).await?;
    let bytes = decode_attachment(&result)?;
    write_atomic(output_path.as_ref(), &bytes).await?;
    Ok(bytes.len())
}

/// Write every successful item of `outcome` into `dir` as
/// `<index>-<fileName>`. Failed items are skipped.
pub async fn write_outcome(
    outcome: &BatchOutcome,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, KrokiError> {
    let dir = dir.as_ref();
    let mut written = Vec::new();

    for result in outcome.items.iter().filter(|r| r.is_success()) {
        let Some((_, attachment)) = result.attachment() else {
            continue;
        };
        let path = dir.join(format!("{}-{}", result.index(), attachment.file_name));
        let bytes = decode_attachment(result)?;
        write_atomic(&path, &bytes).await?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }

    Ok(written)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Results are paired by `InputItem::index` but placed by position; the two
/// must agree or `pairedItem` and output file names would point elsewhere.
fn check_positions(items: &[InputItem]) -> Result<(), KrokiError> {
    match items.iter().enumerate().find(|(pos, item)| item.index != *pos) {
        Some((pos, item)) => Err(KrokiError::InvalidInput {
            detail: format!(
                "item at position {pos} carries index {}; indices must match positions",
                item.index
            ),
        }),
        None => Ok(()),
    }
}

fn resolve_transport(config: &BatchConfig) -> Result<Arc<dyn KrokiTransport>, KrokiError> {
    if let Some(ref transport) = config.transport {
        return Ok(Arc::clone(transport));
    }
    Ok(Arc::new(ReqwestTransport::with_user_agent(&config.user_agent)?))
}

async fn collect(items: &[InputItem], config: &BatchConfig) -> Result<Vec<ResultItem>, KrokiError> {
    let transport = resolve_transport(config)?;
    if config.continue_on_fail {
        collect_all(&transport, items, config).await
    } else {
        collect_until_failure(&transport, items, config).await
    }
}

/// Process one item and fire the matching progress events.
async fn process_with_progress(
    transport: &Arc<dyn KrokiTransport>,
    item: &InputItem,
    total: usize,
    config: &BatchConfig,
) -> Result<ResultItem, ItemFailure> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_item_start(item.index, total);
    }

    let result = item::process_item(transport, item, config.include_debug).await;

    match &result {
        Ok(r) => {
            debug!("Item {} rendered", item.index);
            if let Some(ref cb) = config.progress_callback {
                let encoded_len = r.attachment().map(|(_, a)| a.data.len()).unwrap_or(0);
                cb.on_item_complete(item.index, total, encoded_len);
            }
        }
        Err(f) => {
            warn!("Item {} failed: {}", f.index, f.error);
            if let Some(ref cb) = config.progress_callback {
                cb.on_item_error(f.index, total, &f.error.to_string());
            }
        }
    }
    result
}

/// Continue mode: every item runs; failures become failure records in place.
async fn collect_all(
    transport: &Arc<dyn KrokiTransport>,
    items: &[InputItem],
    config: &BatchConfig,
) -> Result<Vec<ResultItem>, KrokiError> {
    let total = items.len();
    let mut slots: Vec<Option<ResultItem>> = vec![None; total];

    let mut results = stream::iter(items.iter().enumerate().map(|(pos, item)| async move {
        let result = process_with_progress(transport, item, total, config).await;
        (pos, result)
    }))
    .buffer_unordered(config.concurrency);

    while let Some((pos, result)) = results.next().await {
        slots[pos] = Some(match result {
            Ok(r) => r,
            Err(f) => ResultItem::failure(f.index, &f.error),
        });
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(pos, slot)| {
            slot.ok_or_else(|| KrokiError::Internal(format!("No result recorded for item {pos}")))
        })
        .collect()
}

/// Fail-fast mode: results are consumed in input order and the first failure
/// ends the run. Dropping the stream cancels anything still in flight, so
/// later items that were already started never report a result.
async fn collect_until_failure(
    transport: &Arc<dyn KrokiTransport>,
    items: &[InputItem],
    config: &BatchConfig,
) -> Result<Vec<ResultItem>, KrokiError> {
    let total = items.len();
    let mut out = Vec::with_capacity(total);

    let mut results = stream::iter(
        items
            .iter()
            .map(|item| process_with_progress(transport, item, total, config)),
    )
    .buffered(config.concurrency);

    while let Some(result) = results.next().await {
        out.push(result?);
    }
    Ok(out)
}

fn decode_attachment(result: &ResultItem) -> Result<Vec<u8>, KrokiError> {
    let (_, attachment) = result.attachment().ok_or_else(|| {
        KrokiError::Internal(format!("Item {} has no attachment", result.index()))
    })?;
    attachment.decode().map_err(|e| KrokiError::ItemFailed {
        index: result.index(),
        source: e,
    })
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), KrokiError> {
    let write_err = |source| KrokiError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
