/**
 * Logs Route Handler
 * Receives console-only errors forwarded by the admin UI
 */
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
};
use tower_http::request_id::RequestId;

use crate::error::ApiError;
use crate::logging::config::{ClientLogBatch, ClientLogEntry, LogLevel, LogResponse};

/// POST /api/logs
///
/// Entries with a blank message are counted as received but not processed.
pub async fn receive_client_logs(
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<ClientLogBatch>, JsonRejection>,
) -> Result<(StatusCode, Json<LogResponse>), ApiError> {
    let Json(batch) = payload?;

    let req_id = request_id
        .as_ref()
        .and_then(|ext| ext.0.header_value().to_str().ok())
        .unwrap_or("unknown");

    tracing::debug!(request_id = %req_id, batch_size = batch.logs.len(), "received client logs");

    let processed = batch
        .logs
        .iter()
        .filter(|entry| emit_client_log(entry, req_id))
        .count();

    Ok((
        StatusCode::ACCEPTED,
        Json(LogResponse {
            success: true,
            received: batch.logs.len(),
            processed,
        }),
    ))
}

/// Re-emits one entry at its own level. Returns false when skipped.
fn emit_client_log(entry: &ClientLogEntry, request_id: &str) -> bool {
    let message = entry.message.trim();
    if message.is_empty() {
        return false;
    }

    let span = tracing::info_span!(
        "client_log",
        request_id = %request_id,
        timestamp = %entry.timestamp,
        source = "client",
    );
    let _enter = span.enter();

    let context = entry.context.as_ref();
    let metadata = entry.metadata.as_ref();

    match entry.level {
        LogLevel::Trace => tracing::trace!(?context, ?metadata, "{}", message),
        LogLevel::Debug => tracing::debug!(?context, ?metadata, "{}", message),
        LogLevel::Info => tracing::info!(?context, ?metadata, "{}", message),
        LogLevel::Warn => tracing::warn!(?context, ?metadata, "{}", message),
        LogLevel::Error => tracing::error!(?context, ?metadata, "{}", message),
    }

    true
}
