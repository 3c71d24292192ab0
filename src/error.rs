//! HTTP-facing error type. Every handler returns `Result<_, ApiError>`; the
//! response body is always `{ "error": "..." }`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::db::StoreError;
use crate::routes::ErrorResponse;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    /// Storage failure. Only `context` reaches the client.
    #[error("{context}")]
    Persistence {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Validation(ValidationError::new(message))
    }

    /// For `map_err`: wraps a [`StoreError`] with a client-safe message.
    pub fn persistence(context: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Persistence { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::invalid("Invalid request body")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Persistence { context, source } = &self {
            tracing::error!(error = %source, "{}", context);
        }

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::invalid("Name is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("Email already subscribed").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Campaign not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::persistence("Failed to fetch contacts")(StoreError::Unavailable)
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_persistence_error_hides_source() {
        let err = ApiError::persistence("Failed to create contact")(StoreError::Unavailable);
        assert_eq!(err.to_string(), "Failed to create contact");
    }

    #[tokio::test]
    async fn test_into_response_body_shape() {
        let response = ApiError::invalid("Phone number must be 10 digits").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Phone number must be 10 digits" }));
    }
}
