use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::scraper::ScrapeError;

/// Every fetch or extraction failure surfaces as one uniform 500 envelope;
/// nothing is retried and no partial body is ever sent.
#[derive(Debug)]
pub enum ApiError {
    Upstream { message: String, details: String },
}

impl ApiError {
    pub fn upstream(message: &str, err: ScrapeError) -> Self {
        error!("{message}: {err}");
        ApiError::Upstream {
            message: message.to_string(),
            details: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": message,
                    "details": details,
                })),
            )
                .into_response(),
        }
    }
}
