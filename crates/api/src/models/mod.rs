//! Domain models for the API.
//!
//! These types are validated domain objects, separate from the database row
//! types in [`crate::db`] and the request/response bodies in [`crate::routes`].

pub mod label;
pub mod recipe;
pub mod user;

pub use label::{Ingredient, IngredientKind, Label, LabelKind, Tag, TagKind};
pub use recipe::{NewRecipe, Recipe, RecipeChanges, RecipeDetail};
pub use user::{NewUser, User};
