// --- File: crates/calrelay_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::error::{HttpStatusCode, RelayError};

// Include the client module
pub mod client;

/// Success envelope shared by every JSON endpoint: `{message, data}`.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Renders the error as `{"error": "...", "details": ...}`.
///
/// `details` is only present when the error carries a structured body.
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match self.details() {
            Some(details) => json!({ "error": self.to_string(), "details": details }),
            None => json!({ "error": self.to_string() }),
        };

        (status_code, Json(body)).into_response()
    }
}
