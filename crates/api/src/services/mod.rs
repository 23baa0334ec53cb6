//! Business logic services.
//!
//! # Services
//!
//! - `accounts` - User provisioning, password hashing and API tokens
//! - `media` - Uploaded image storage
//! - `recipes` - Recipe operations with image file cleanup

pub mod accounts;
pub mod media;
pub mod recipes;

pub use accounts::{AccountError, AccountService};
pub use media::{MediaError, MediaStore};
pub use recipes::{RecipeError, RecipeService};
