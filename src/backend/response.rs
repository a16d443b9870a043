//! Success envelope returned by every JSON handler.
//!
//! ```json
//! { "message": "Member invited", "result": { ... }, "code": 201 }
//! ```
//!
//! Failures use the same shape without `result`; see `BackendError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub result: T,
    pub code: u16,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, result: T) -> Self {
        Self::with_status(StatusCode::OK, message, result)
    }

    pub fn created(message: impl Into<String>, result: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, result)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, result: T) -> Self {
        Self {
            message: message.into(),
            result,
            code: status.as_u16(),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
