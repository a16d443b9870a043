//! Request extractors that reject with `BackendError`.
//!
//! Drop-in replacements for axum's `Json`, `Path` and `Query`. A malformed
//! body, an unknown enum value or an unparsable id comes back as a 400
//! `{message, code}` envelope instead of axum's plain-text rejection.

use axum::extract::{FromRequest, FromRequestParts};

use crate::backend::error::BackendError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BackendError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(BackendError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(BackendError))]
pub struct ApiQuery<T>(pub T);
