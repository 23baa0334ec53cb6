//! Recipe operations that touch both the database and media storage.
//!
//! Image files are removed only after the database change has committed; a
//! failed removal is logged and leaves an orphaned file rather than failing
//! the request.

use sqlx::PgPool;
use thiserror::Error;

use recipe_box_core::{RecipeId, UserId};

use super::media::{MediaError, MediaStore};
use crate::db::{RecipeRepository, RepositoryError};
use crate::models::recipe::Recipe;

/// Errors from recipe operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Recipe service.
pub struct RecipeService<'a> {
    recipes: RecipeRepository<'a>,
    media: &'a MediaStore,
}

impl<'a> RecipeService<'a> {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaStore) -> Self {
        Self {
            recipes: RecipeRepository::new(pool),
            media,
        }
    }

    /// Store an uploaded image and attach it to one of the user's recipes,
    /// removing the image it replaces.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if the user has no such
    /// recipe, and `MediaError::UnsupportedImage` (wrapped) if the upload is
    /// not an image. In both cases nothing is changed.
    pub async fn upload_image(
        &self,
        user_id: UserId,
        id: RecipeId,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<Recipe, RecipeError> {
        if self.recipes.get(user_id, id).await?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let stored = self.media.save_recipe_image(original_filename, bytes).await?;

        let (recipe, previous) = match self.recipes.set_image(user_id, id, &stored).await {
            Ok(result) => result,
            Err(e) => {
                self.remove_file(&stored).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous.filter(|previous| *previous != stored) {
            self.remove_file(&previous).await;
        }

        tracing::info!(recipe_id = %id, image = %stored, "Recipe image uploaded");
        Ok(recipe)
    }

    /// Delete one of the user's recipes and its image file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if the user has no such
    /// recipe.
    pub async fn delete(&self, user_id: UserId, id: RecipeId) -> Result<(), RecipeError> {
        if let Some(image) = self.recipes.delete(user_id, id).await? {
            self.remove_file(&image).await;
        }
        Ok(())
    }

    async fn remove_file(&self, relative: &str) {
        if let Err(e) = self.media.delete(relative).await {
            tracing::warn!(path = %relative, error = %e, "Failed to remove image file");
        }
    }
}
