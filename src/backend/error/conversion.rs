/**
 * Error Conversion
 *
 * `IntoResponse` for `BackendError`, so handlers can return it directly.
 * Extractor rejections (bad JSON body, path or query) become `Validation`.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "message": "Project not found",
 *   "code": 404
 * }
 * ```
 */

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Error] {}", self);
        } else {
            tracing::debug!("[Error] {}", self);
        }

        let body = serde_json::json!({
            "message": self.message(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        BackendError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for BackendError {
    fn from(rejection: PathRejection) -> Self {
        BackendError::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for BackendError {
    fn from(rejection: QueryRejection) -> Self {
        BackendError::validation("query", rejection.body_text())
    }
}

impl From<jsonwebtoken::errors::Error> for BackendError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        BackendError::unauthorized(format!("Invalid token: {}", err))
    }
}

impl From<lettre::error::Error> for BackendError {
    fn from(err: lettre::error::Error) -> Self {
        BackendError::transport(format!("Failed to build email: {}", err))
    }
}

impl From<lettre::address::AddressError> for BackendError {
    fn from(err: lettre::address::AddressError) -> Self {
        BackendError::transport(format!("Invalid email address: {}", err))
    }
}
