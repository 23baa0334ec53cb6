//! Tag and ingredient repository.
//!
//! Both label kinds share one repository; table names come from the
//! [`LabelKind`] marker, so the SQL is assembled from its constants.

use core::marker::PhantomData;

use sqlx::PgPool;

use recipe_box_core::{RecipeId, UserId};

use super::RepositoryError;
use crate::models::label::{Label, LabelKind};

#[derive(Debug, sqlx::FromRow)]
struct LabelRow {
    id: i32,
    user_id: UserId,
    name: String,
}

impl<K: LabelKind> From<LabelRow> for Label<K> {
    fn from(row: LabelRow) -> Self {
        Self::new(K::Id::from(row.id), row.user_id, row.name)
    }
}

fn raw_id<K: LabelKind>(id: K::Id) -> i32 {
    id.into()
}

/// Repository for one kind of label.
pub struct LabelRepository<'a, K: LabelKind> {
    pool: &'a PgPool,
    kind: PhantomData<K>,
}

impl<'a, K: LabelKind> LabelRepository<'a, K> {
    /// Create a new label repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            kind: PhantomData,
        }
    }

    /// List a user's labels, ordered by name descending.
    ///
    /// With `assigned_only`, only labels attached to at least one recipe are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label<K>>, RepositoryError> {
        let sql = format!(
            r"
            SELECT l.id, l.user_id, l.name
            FROM {table} l
            WHERE l.user_id = $1
              AND (NOT $2 OR EXISTS (
                  SELECT 1 FROM {link} r WHERE r.{column} = l.id
              ))
            ORDER BY l.name DESC, l.id DESC
            ",
            table = K::TABLE,
            link = K::LINK_TABLE,
            column = K::LINK_COLUMN,
        );

        let rows = sqlx::query_as::<_, LabelRow>(&sql)
            .bind(user_id)
            .bind(assigned_only)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Label::from).collect())
    }

    /// Get one of a user's labels.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: K::Id,
    ) -> Result<Option<Label<K>>, RepositoryError> {
        let sql = format!(
            "SELECT id, user_id, name FROM {} WHERE id = $1 AND user_id = $2",
            K::TABLE
        );

        let row = sqlx::query_as::<_, LabelRow>(&sql)
            .bind(raw_id::<K>(id))
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Label::from))
    }

    /// Labels attached to a recipe, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_recipe(
        &self,
        recipe_id: RecipeId,
    ) -> Result<Vec<Label<K>>, RepositoryError> {
        let sql = format!(
            r"
            SELECT l.id, l.user_id, l.name
            FROM {table} l
            JOIN {link} r ON r.{column} = l.id
            WHERE r.recipe_id = $1
            ORDER BY l.id
            ",
            table = K::TABLE,
            link = K::LINK_TABLE,
            column = K::LINK_COLUMN,
        );

        let rows = sqlx::query_as::<_, LabelRow>(&sql)
            .bind(recipe_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Label::from).collect())
    }

    /// Create a label owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, user_id: UserId, name: &str) -> Result<Label<K>, RepositoryError> {
        let sql = format!(
            "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
            K::TABLE
        );

        let row = sqlx::query_as::<_, LabelRow>(&sql)
            .bind(user_id)
            .bind(name)
            .fetch_one(self.pool)
            .await?;

        tracing::debug!(kind = K::NAME, id = row.id, "Label created");
        Ok(row.into())
    }

    /// Rename one of a user's labels.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such label.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rename(
        &self,
        user_id: UserId,
        id: K::Id,
        name: &str,
    ) -> Result<Label<K>, RepositoryError> {
        let sql = format!(
            "UPDATE {} SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, user_id, name",
            K::TABLE
        );

        let row = sqlx::query_as::<_, LabelRow>(&sql)
            .bind(raw_id::<K>(id))
            .bind(user_id)
            .bind(name)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete one of a user's labels. Links to recipes are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such label.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: K::Id) -> Result<(), RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", K::TABLE);

        let id = raw_id::<K>(id);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(kind = K::NAME, id, "Label deleted");
        Ok(())
    }
}
