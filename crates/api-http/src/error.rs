//! HTTP Error Mapping
//!
//! Maps application errors to status codes with a `{"error": msg}` body.

use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use queuescale_core::error::AppError;

/// Handler error wrapper (orphan rules keep `IntoResponse` off `AppError`)
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Status code for an application error
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        AppError::InvalidInput(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Validation(_) | AppError::Domain(_) | AppError::Serialization(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidState(_) => StatusCode::CONFLICT,
        AppError::Execution(_) | AppError::Config(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
