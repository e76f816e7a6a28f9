use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

/// Per-request failure. Client mistakes map to 400, everything past
/// validation (coercion, model call, output conversion) maps to 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request body is empty or not a valid JSON object")]
    EmptyBody,

    #[error("the following fields are required: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyBody | ApiError::MissingFields(_) => StatusCode::BAD_REQUEST,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Numeric coercion failure for a single field.
#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
    #[error("field '{field}': could not convert {value:?} to a number")]
    NotANumber { field: String, value: String },

    #[error("field '{field}': expected a string or a number, got {kind}")]
    WrongType { field: String, kind: &'static str },
}

impl From<FeatureError> for ApiError {
    fn from(e: FeatureError) -> Self {
        ApiError::Prediction(e.to_string())
    }
}
