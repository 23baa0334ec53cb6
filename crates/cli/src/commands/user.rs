//! User provisioning commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a regular user
//! rb-cli user create -e user@example.com -p secret -n "Jane Cook"
//!
//! # Create a superuser (staff + superuser flags)
//! rb-cli user create -e admin@example.com -p secret --superuser
//! ```

use thiserror::Error;

use recipe_box_api::db::create_pool;
use recipe_box_api::services::{AccountError, AccountService};
use recipe_box_core::UserId;

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("A superuser needs a password")]
    MissingPassword,

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("{0}")]
    Account(AccountError),
}

/// Options for `user create`.
#[derive(Debug)]
pub struct CreateUser<'a> {
    pub email: &'a str,
    pub password: Option<&'a str>,
    pub name: &'a str,
    pub superuser: bool,
}

/// Create a user and return their ID.
pub async fn create(options: CreateUser<'_>) -> Result<UserId, UserCommandError> {
    if options.superuser && options.password.is_none() {
        return Err(UserCommandError::MissingPassword);
    }

    let database_url = database_url()?;
    let pool = create_pool(&database_url).await?;
    let accounts = AccountService::new(&pool);

    let result = match (options.superuser, options.password) {
        (true, Some(password)) => {
            accounts
                .create_superuser(options.email, password, options.name)
                .await
        }
        (_, password) => {
            accounts
                .create_user(options.email, password, options.name)
                .await
        }
    };

    let user = result.map_err(|e| match e {
        AccountError::EmailTaken => UserCommandError::UserExists(options.email.to_owned()),
        other => UserCommandError::Account(other),
    })?;

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        superuser = user.is_superuser,
        "User created"
    );
    Ok(user.id)
}
