//! Item processing: run every stage for one input item.
//!
//! Never panics and never lets a stage error escape unclassified: the result
//! is either a success [`ResultItem`] or an [`ItemFailure`] carrying the
//! item's index. What happens to a failure is the batch runner's decision.

use crate::error::{ItemError, ItemFailure};
use crate::output::{DebugInfo, ResultItem, SuccessRecord};
use crate::pipeline::encode::encode_artifact;
use crate::pipeline::input::InputItem;
use crate::pipeline::normalize::normalize_response;
use crate::pipeline::params::{resolve_parameters, ResolvedParameters};
use crate::pipeline::request::{build_request, RenderRequest};
use crate::pipeline::transport::{KrokiTransport, RawBody};
use std::sync::Arc;
use tracing::debug;

/// PNG file signature prefix.
const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// Render one item.
///
/// # Arguments
/// * `transport`     — sends the single HTTP call for this item
/// * `item`          — raw parameters plus the input position
/// * `include_debug` — attach a [`DebugInfo`] to the success record
///
/// # Errors
/// An [`ItemFailure`] tagged with `item.index`, from whichever stage failed
/// first. Validation failures never reach the transport.
pub async fn process_item(
    transport: &Arc<dyn KrokiTransport>,
    item: &InputItem,
    include_debug: bool,
) -> Result<ResultItem, ItemFailure> {
    render_item(&**transport, item, include_debug)
        .await
        .map_err(|error| ItemFailure {
            index: item.index,
            error,
        })
}

async fn render_item(
    transport: &dyn KrokiTransport,
    item: &InputItem,
    include_debug: bool,
) -> Result<ResultItem, ItemError> {
    let params = resolve_parameters(&item.params)?;
    let request = build_request(&params);

    let body = transport.send(&request).await?;
    debug!(
        "Item {}: {} body, {} bytes",
        item.index,
        body.kind(),
        body.len()
    );
    let debug = include_debug.then(|| debug_info(&body, &request, &params));

    let artifact = normalize_response(body, params.output_format)?;
    let attachment = encode_artifact(&artifact)?;

    let record = SuccessRecord {
        diagram_type: params.diagram_type,
        output_format: params.output_format,
        file_name: artifact.file_name.clone(),
        mime_type: artifact.mime_type.to_string(),
        success: true,
        debug,
    };

    Ok(ResultItem::success(
        item.index,
        record,
        params.binary_property_name,
        attachment,
    ))
}

fn debug_info(body: &RawBody, request: &RenderRequest, params: &ResolvedParameters) -> DebugInfo {
    let mut info = DebugInfo {
        body_kind: body.kind().to_string(),
        body_length: body.len(),
        url: request.url.clone(),
        diagram_length: params.source.chars().count(),
        ..DebugInfo::default()
    };

    match body {
        RawBody::Bytes(bytes) => {
            info.first_bytes = Some(bytes.iter().take(16).map(|b| format!("{b:02x}")).collect());
            info.starts_with_png = Some(bytes.starts_with(&PNG_SIGNATURE));
        }
        RawBody::Text { body, .. } if params.output_format.is_textual() => {
            info.first_chars = Some(body.chars().take(100).collect());
        }
        _ => {}
    }
    info
}
