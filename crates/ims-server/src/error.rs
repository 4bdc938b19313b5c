use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ims_types::CoreError;
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Translates the core's error taxonomy and this crate's own request
/// validation into an HTTP response. `PARTIAL_WRITE` never reaches here —
/// the coordinator already folds it into a successful `Ok` and logs it at
/// warn, matching the "success to caller, logged" handling.
pub enum ApiError {
    Core(CoreError),
    BadRequest(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Core(CoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", CoreError::NotFound.to_string())
            }
            ApiError::Core(CoreError::Contention) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CONTENTION",
                CoreError::Contention.to_string(),
            ),
            ApiError::Core(CoreError::UpstreamUnavailable(reason)) => {
                let message = CoreError::UpstreamUnavailable(reason).to_string();
                (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", message)
            }
            ApiError::Core(CoreError::LocalStoreError(reason)) => {
                let message = CoreError::LocalStoreError(reason).to_string();
                (StatusCode::SERVICE_UNAVAILABLE, "LOCAL_STORE_ERROR", message)
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
        };

        tracing::warn!(code, message = %message, "request failed");
        (status, Json(ErrorBody { code, message })).into_response()
    }
}
