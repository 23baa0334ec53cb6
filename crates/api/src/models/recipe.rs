//! Recipe domain types.

use core::fmt;

use recipe_box_core::{Associations, IngredientId, Price, RecipeId, TagId, UserId};

use super::label::{Ingredient, Tag};

/// A recipe with the IDs of its tags and ingredients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Recipe ID.
    pub id: RecipeId,
    /// Owner; fixed at creation.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Preparation time in minutes.
    pub time_minutes: i32,
    /// Price.
    pub price: Price,
    /// External link; empty when unset.
    pub link: String,
    /// Image path relative to the media root.
    pub image: Option<String>,
    /// Attached tags, ascending.
    pub tag_ids: Vec<TagId>,
    /// Attached ingredients, ascending.
    pub ingredient_ids: Vec<IngredientId>,
}

impl Associations for Recipe {
    fn tag_ids(&self) -> &[TagId] {
        &self.tag_ids
    }

    fn ingredient_ids(&self) -> &[IngredientId] {
        &self.ingredient_ids
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A recipe with its tags and ingredients loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetail {
    /// The recipe itself.
    pub recipe: Recipe,
    /// Attached tags, ordered by ID.
    pub tags: Vec<Tag>,
    /// Attached ingredients, ordered by ID.
    pub ingredients: Vec<Ingredient>,
}

/// A validated recipe ready to be inserted, or the full replacement of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<TagId>,
    pub ingredients: Vec<IngredientId>,
}

/// A validated partial update. `None` leaves a field untouched; a supplied
/// tag or ingredient list replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub tags: Option<Vec<TagId>>,
    pub ingredients: Option<Vec<IngredientId>>,
}

impl From<NewRecipe> for RecipeChanges {
    fn from(recipe: NewRecipe) -> Self {
        Self {
            title: Some(recipe.title),
            time_minutes: Some(recipe.time_minutes),
            price: Some(recipe.price),
            link: Some(recipe.link),
            tags: Some(recipe.tags),
            ingredients: Some(recipe.ingredients),
        }
    }
}
