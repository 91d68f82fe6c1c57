//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use motionlights_domain::error::MotionLightsError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`MotionLightsError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(MotionLightsError);

impl From<MotionLightsError> for ApiError {
    fn from(err: MotionLightsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MotionLightsError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            MotionLightsError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            MotionLightsError::Stopped => (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string()),
            MotionLightsError::Scheduler(err) => {
                tracing::error!(error = %err, "scheduler error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
