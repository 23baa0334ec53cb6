//! User domain types.

use chrono::{DateTime, Utc};

use recipe_box_core::{Email, UserId};

/// A registered user (domain type).
///
/// The password hash never leaves the repository layer; see
/// [`crate::db::users::UserRepository::get_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address, used to log in.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Inactive users cannot authenticate.
    pub is_active: bool,
    /// Whether the user may access staff tooling.
    pub is_staff: bool,
    /// Whether the user has every permission.
    pub is_superuser: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// A user ready to be inserted.
///
/// Built by [`crate::services::accounts`], which validates the email and
/// hashes the password first.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Argon2id PHC string, or `None` for an account without a usable password.
    pub password_hash: Option<String>,
    /// Staff flag.
    pub is_staff: bool,
    /// Superuser flag.
    pub is_superuser: bool,
}
