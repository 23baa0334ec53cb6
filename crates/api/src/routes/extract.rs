//! Request extractors with JSON error bodies.

use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// `axum::Json`, but malformed bodies are rejected with [`AppError`] so the
/// client gets `{"detail": ...}` instead of plain text.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Take a required field, reporting it by name when absent.
pub fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::field(field, "This field is required."))
}

/// Validate a required text field: trimmed, non-blank, at most `max` characters.
pub fn non_blank(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::field(field, "This field may not be blank."));
    }
    max_length(field, value, max)
}

/// Validate an optional text field's length.
pub fn max_length(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    if value.chars().count() > max {
        return Err(AppError::field(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(value.to_owned())
}
