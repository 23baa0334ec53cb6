//! Recipe Box Core - Shared types library.
//!
//! This crate provides common types used across all Recipe Box components:
//! - `api` - The HTTP API server
//! - `cli` - Command-line tools for migrations and user provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP handling. This keeps it lightweight and allows it to be
//! used (and tested) anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails
//! - [`image_path`] - Storage paths for uploaded recipe images
//! - [`filter`] - Tag/ingredient association filtering for recipe listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod filter;
pub mod image_path;
pub mod types;

pub use filter::{AssociationFilter, Associations, IdTokenError, filter_by_associations};
pub use image_path::{RECIPE_IMAGE_DIR, UniqueIdSource, UuidV4Source, recipe_image_path};
pub use types::*;
