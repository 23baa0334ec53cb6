//! API token repository.
//!
//! Each user has at most one token. Tokens are 40 lowercase hex characters and
//! are sent as `Authorization: Token <key>`.

use sqlx::PgPool;

use recipe_box_core::UserId;

use super::RepositoryError;
use crate::models::user::User;

/// Repository for API token operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the user's token, storing `candidate` if they don't have one yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(
        &self,
        user_id: UserId,
        candidate: &str,
    ) -> Result<String, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO core.auth_token (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(candidate)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        let key: String = sqlx::query_scalar("SELECT key FROM core.auth_token WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(key)
    }

    /// Resolve a token to its active user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_user_by_key(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let user_id: Option<UserId> = sqlx::query_scalar(
            r"
            SELECT t.user_id
            FROM core.auth_token t
            JOIN core.user u ON u.id = t.user_id
            WHERE t.key = $1 AND u.is_active
            ",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        match user_id {
            Some(id) => super::UserRepository::new(self.pool).get_by_id(id).await,
            None => Ok(None),
        }
    }
}
