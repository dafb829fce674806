use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use teller_agents::PredictError;

const REDACTED_INFERENCE_DETAIL: &str = "Model prediction failed.";

/// Errors surfaced to HTTP callers as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn from_predict(err: PredictError, redact: bool) -> Self {
        match err {
            PredictError::Validation(err) => Self::BadRequest(err.to_string()),
            PredictError::Inference(_) if redact => {
                Self::Internal(REDACTED_INFERENCE_DETAIL.to_string())
            }
            err @ PredictError::Inference(_) => Self::Internal(err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::BadRequest(detail) | Self::Internal(detail) => detail,
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
