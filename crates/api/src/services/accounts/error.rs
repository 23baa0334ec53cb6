//! Account error types.

use thiserror::Error;

use recipe_box_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Missing or malformed email.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password does not meet requirements.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Another account already uses the email.
    #[error("user with this email already exists")]
    EmailTaken,

    /// Wrong password, unknown email, or inactive account.
    #[error("unable to authenticate with provided credentials")]
    InvalidCredentials,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
