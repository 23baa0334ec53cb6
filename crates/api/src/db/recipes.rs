//! Recipe repository.
//!
//! Recipes are always loaded together with the IDs of their tags and
//! ingredients (aggregated in SQL), so listings can be filtered in memory with
//! [`AssociationFilter`]. Writes that touch the link tables run in a single
//! transaction.

use sqlx::{PgConnection, PgPool};

use recipe_box_core::{AssociationFilter, IngredientId, Price, RecipeId, TagId, UserId};

use super::{LabelRepository, RepositoryError};
use crate::models::label::{IngredientKind, LabelKind, TagKind};
use crate::models::recipe::{NewRecipe, Recipe, RecipeChanges, RecipeDetail};

const RECIPE_SELECT: &str = r"
    SELECT r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image,
           COALESCE(
               (SELECT array_agg(rt.tag_id ORDER BY rt.tag_id)
                FROM core.recipe_tags rt WHERE rt.recipe_id = r.id),
               '{}'
           ) AS tag_ids,
           COALESCE(
               (SELECT array_agg(ri.ingredient_id ORDER BY ri.ingredient_id)
                FROM core.recipe_ingredients ri WHERE ri.recipe_id = r.id),
               '{}'
           ) AS ingredient_ids
    FROM core.recipe r
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: RecipeId,
    user_id: UserId,
    title: String,
    time_minutes: i32,
    price: Price,
    link: String,
    image: Option<String>,
    tag_ids: Vec<i32>,
    ingredient_ids: Vec<i32>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link,
            image: row.image,
            tag_ids: row.tag_ids.into_iter().map(TagId::new).collect(),
            ingredient_ids: row.ingredient_ids.into_iter().map(IngredientId::new).collect(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for recipe database operations.
pub struct RecipeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepository<'a> {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's recipes in ID order, keeping those that pass `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        filter: &AssociationFilter,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "{RECIPE_SELECT} WHERE r.user_id = $1 ORDER BY r.id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let recipes = rows.into_iter().map(Recipe::from).collect();
        Ok(filter.apply(recipes))
    }

    /// Get one of a user's recipes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "{RECIPE_SELECT} WHERE r.id = $1 AND r.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Recipe::from))
    }

    /// Get one of a user's recipes with its tags and ingredients loaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<RecipeDetail>, RepositoryError> {
        let Some(recipe) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let tags = LabelRepository::<TagKind>::new(self.pool)
            .list_for_recipe(id)
            .await?;
        let ingredients = LabelRepository::<IngredientKind>::new(self.pool)
            .list_for_recipe(id)
            .await?;

        Ok(Some(RecipeDetail {
            recipe,
            tags,
            ingredients,
        }))
    }

    /// Insert a recipe and its links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownReference` if a tag or ingredient ID
    /// does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        recipe: &NewRecipe,
    ) -> Result<Recipe, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        ensure_labels_exist::<TagKind>(&mut tx, &recipe.tags).await?;
        ensure_labels_exist::<IngredientKind>(&mut tx, &recipe.ingredients).await?;

        let id: RecipeId = sqlx::query_scalar(
            r"
            INSERT INTO core.recipe (user_id, title, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.link)
        .fetch_one(&mut *tx)
        .await?;

        replace_links::<TagKind>(&mut tx, id, &recipe.tags).await?;
        replace_links::<IngredientKind>(&mut tx, id, &recipe.ingredients).await?;

        tx.commit().await?;

        tracing::info!(recipe_id = %id, user_id = %user_id, "Recipe created");
        self.get(user_id, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply changes to one of a user's recipes.
    ///
    /// Scalar fields set to `None` are left untouched; a supplied tag or
    /// ingredient list replaces the existing links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such recipe.
    /// Returns `RepositoryError::UnknownReference` if a tag or ingredient ID
    /// does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        user_id: UserId,
        id: RecipeId,
        changes: &RecipeChanges,
    ) -> Result<Recipe, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(tags) = &changes.tags {
            ensure_labels_exist::<TagKind>(&mut tx, tags).await?;
        }
        if let Some(ingredients) = &changes.ingredients {
            ensure_labels_exist::<IngredientKind>(&mut tx, ingredients).await?;
        }

        let updated: Option<RecipeId> = sqlx::query_scalar(
            r"
            UPDATE core.recipe
            SET title = COALESCE($3, title),
                time_minutes = COALESCE($4, time_minutes),
                price = COALESCE($5, price),
                link = COALESCE($6, link)
            WHERE id = $1 AND user_id = $2
            RETURNING id
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.title.as_deref())
        .bind(changes.time_minutes)
        .bind(changes.price)
        .bind(changes.link.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound);
        }

        if let Some(tags) = &changes.tags {
            replace_links::<TagKind>(&mut tx, id, tags).await?;
        }
        if let Some(ingredients) = &changes.ingredients {
            replace_links::<IngredientKind>(&mut tx, id, ingredients).await?;
        }

        tx.commit().await?;

        tracing::debug!(recipe_id = %id, "Recipe updated");
        self.get(user_id, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Point a recipe at a newly stored image.
    ///
    /// Returns the updated recipe and the path of the image it replaced, which
    /// the caller is responsible for removing from storage.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such recipe.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_image(
        &self,
        user_id: UserId,
        id: RecipeId,
        image: &str,
    ) -> Result<(Recipe, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> = sqlx::query_scalar::<_, Option<String>>(
            "SELECT image FROM core.recipe WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query("UPDATE core.recipe SET image = $2 WHERE id = $1")
            .bind(id)
            .bind(image)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let recipe = self.get(user_id, id).await?.ok_or(RepositoryError::NotFound)?;
        Ok((recipe, previous))
    }

    /// Delete one of a user's recipes. Links are removed by cascade.
    ///
    /// Returns the path of the recipe's image, if it had one, so the caller
    /// can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such recipe.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<String>, RepositoryError> {
        let image = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM core.recipe WHERE id = $1 AND user_id = $2 RETURNING image",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tracing::info!(recipe_id = %id, user_id = %user_id, "Recipe deleted");
        Ok(image)
    }
}

// =============================================================================
// Link Helpers
// =============================================================================

fn raw_ids<I: Copy + Into<i32>>(ids: &[I]) -> Vec<i32> {
    ids.iter().map(|&id| id.into()).collect()
}

/// Fail with `UnknownReference` for the first ID that has no row.
async fn ensure_labels_exist<K: LabelKind>(
    conn: &mut PgConnection,
    ids: &[K::Id],
) -> Result<(), RepositoryError> {
    if ids.is_empty() {
        return Ok(());
    }

    let wanted = raw_ids(ids);
    let found: Vec<i32> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE id = ANY($1)",
        K::TABLE
    ))
    .bind(&wanted)
    .fetch_all(&mut *conn)
    .await?;

    match wanted.into_iter().find(|id| !found.contains(id)) {
        Some(id) => Err(RepositoryError::UnknownReference {
            field: K::FIELD,
            id,
        }),
        None => Ok(()),
    }
}

/// Replace every link of `recipe_id` to labels of kind `K`.
async fn replace_links<K: LabelKind>(
    conn: &mut PgConnection,
    recipe_id: RecipeId,
    ids: &[K::Id],
) -> Result<(), RepositoryError> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = $1",
        K::LINK_TABLE
    ))
    .bind(recipe_id)
    .execute(&mut *conn)
    .await?;

    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(&format!(
        r"
        INSERT INTO {link} (recipe_id, {column})
        SELECT $1, u.id FROM UNNEST($2::int4[]) AS u(id)
        ON CONFLICT DO NOTHING
        ",
        link = K::LINK_TABLE,
        column = K::LINK_COLUMN,
    ))
    .bind(recipe_id)
    .bind(raw_ids(ids))
    .execute(&mut *conn)
    .await?;

    Ok(())
}
