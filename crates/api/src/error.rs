//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry and logged before a generic 500 is returned; client
//! errors become JSON bodies, either `{"detail": "..."}` or, for a problem
//! with one input field, `{"<field>": ["..."]}`.

use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use recipe_box_core::IdTokenError;

use crate::db::RepositoryError;
use crate::services::{AccountError, MediaError, RecipeError};

/// Field name used for errors not tied to a single input.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account operation failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Recipe operation failed.
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// One input field is invalid.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Multipart body could not be read.
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl AppError {
    /// Build a validation error for `field`.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<IdTokenError> for AppError {
    fn from(err: IdTokenError) -> Self {
        Self::field(
            err.param,
            format!("\"{}\" is not a valid integer identifier.", err.token),
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// What the client sees.
enum Body {
    Detail(String),
    Field(String, String),
    Server,
}

fn classify_repository(err: &RepositoryError) -> (StatusCode, Body) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, Body::Detail("Not found.".to_owned())),
        RepositoryError::Conflict(msg) => (StatusCode::BAD_REQUEST, Body::Detail(msg.clone())),
        RepositoryError::UnknownReference { field, id } => (
            StatusCode::BAD_REQUEST,
            Body::Field(
                (*field).to_owned(),
                format!("Invalid pk \"{id}\" - object does not exist."),
            ),
        ),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Body::Server)
        }
    }
}

fn classify_account(err: &AccountError) -> (StatusCode, Body) {
    match err {
        AccountError::InvalidEmail(e) => (
            StatusCode::BAD_REQUEST,
            Body::Field("email".to_owned(), e.to_string()),
        ),
        AccountError::WeakPassword(msg) => (
            StatusCode::BAD_REQUEST,
            Body::Field("password".to_owned(), msg.clone()),
        ),
        AccountError::EmailTaken => (
            StatusCode::BAD_REQUEST,
            Body::Field("email".to_owned(), "user with this email already exists.".to_owned()),
        ),
        AccountError::InvalidCredentials => (
            StatusCode::BAD_REQUEST,
            Body::Field(
                NON_FIELD_ERRORS.to_owned(),
                "Unable to authenticate with provided credentials.".to_owned(),
            ),
        ),
        AccountError::Repository(e) => classify_repository(e),
        AccountError::PasswordHash => (StatusCode::INTERNAL_SERVER_ERROR, Body::Server),
    }
}

fn classify_recipe(err: &RecipeError) -> (StatusCode, Body) {
    match err {
        RecipeError::Repository(e) => classify_repository(e),
        RecipeError::Media(e @ MediaError::UnsupportedImage) => (
            StatusCode::BAD_REQUEST,
            Body::Field("image".to_owned(), sentence(&e.to_string())),
        ),
        RecipeError::Media(MediaError::Io(_)) => (StatusCode::INTERNAL_SERVER_ERROR, Body::Server),
    }
}

/// Capitalize a lowercase error message and end it with a period.
pub(crate) fn sentence(message: &str) -> String {
    let mut chars = message.chars();
    let mut sentence: String = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    if !sentence.ends_with('.') {
        sentence.push('.');
    }
    sentence
}

impl AppError {
    fn classify(&self) -> (StatusCode, Body) {
        match self {
            Self::Database(e) => classify_repository(e),
            Self::Account(e) => classify_account(e),
            Self::Recipe(e) => classify_recipe(e),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, Body::Detail(msg.clone())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, Body::Detail(msg.clone())),
            Self::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Body::Field(field.clone(), message.clone()),
            ),
            Self::Multipart(e) => match e.status() {
                status if status.is_server_error() => (status, Body::Server),
                status => (status, Body::Detail(e.body_text())),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match body {
            Body::Detail(detail) => json!({ "detail": detail }),
            Body::Field(field, message) => {
                let mut errors = serde_json::Map::new();
                errors.insert(field, json!([message]));
                serde_json::Value::Object(errors)
            }
            Body::Server => json!({ "detail": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
