use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Request log line: start at debug, completion at a level picked from the
/// status class. Health probes are only logged when they fail.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let quiet = path.starts_with("/health");

    let req_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    if !quiet {
        tracing::debug!(request_id = %req_id, method = %method, path = %path, "incoming request");
    }

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    match completion_level(status) {
        CompletionLevel::Error => tracing::error!(
            request_id = %req_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            "request failed"
        ),
        CompletionLevel::Warn => tracing::warn!(
            request_id = %req_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            "request rejected"
        ),
        CompletionLevel::Info if !quiet => tracing::info!(
            request_id = %req_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms,
            "request completed"
        ),
        CompletionLevel::Info => {}
    }

    response
}

#[derive(Debug, PartialEq, Eq)]
enum CompletionLevel {
    Info,
    Warn,
    Error,
}

fn completion_level(status: StatusCode) -> CompletionLevel {
    if status.is_server_error() {
        CompletionLevel::Error
    } else if status.is_client_error() {
        CompletionLevel::Warn
    } else {
        CompletionLevel::Info
    }
}

/// Assigns an `x-request-id` to requests that arrive without one.
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Echoes the request id back on the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_level_by_status_class() {
        assert_eq!(completion_level(StatusCode::CREATED), CompletionLevel::Info);
        assert_eq!(completion_level(StatusCode::NOT_FOUND), CompletionLevel::Warn);
        assert_eq!(
            completion_level(StatusCode::SERVICE_UNAVAILABLE),
            CompletionLevel::Error
        );
    }
}
