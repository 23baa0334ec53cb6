//! Account provisioning and token authentication.
//!
//! Preparing a [`NewUser`] (email normalization, password checks, hashing) is
//! pure and happens before the database is touched. [`AccountService`] wires
//! the prepared values to the user and token repositories.

mod error;

pub use error::AccountError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;
use sqlx::PgPool;

use recipe_box_core::Email;

use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::user::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Token length in bytes before hex encoding.
const TOKEN_BYTES: usize = 20;

impl NewUser {
    /// Prepare a regular user.
    ///
    /// The email's domain is lowercased. Without a password the account gets
    /// no usable credential and cannot log in.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` if the email is empty or malformed.
    /// Returns `AccountError::WeakPassword` if the password is too short.
    /// Returns `AccountError::PasswordHash` if hashing fails.
    pub fn standard(email: &str, password: Option<&str>, name: &str) -> Result<Self, AccountError> {
        let email = Email::parse(email)?;
        let password_hash = password
            .map(|password| {
                validate_password(password)?;
                hash_password(password)
            })
            .transpose()?;

        Ok(Self {
            email,
            name: name.trim().to_owned(),
            password_hash,
            is_staff: false,
            is_superuser: false,
        })
    }

    /// Prepare a superuser: a regular user with the staff and superuser flags.
    ///
    /// # Errors
    ///
    /// Same as [`NewUser::standard`].
    pub fn superuser(email: &str, password: &str, name: &str) -> Result<Self, AccountError> {
        Ok(Self {
            is_staff: true,
            is_superuser: true,
            ..Self::standard(email, Some(password), name)?
        })
    }
}

/// Requested profile changes. `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Account service.
pub struct AccountService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    /// Create a regular user.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::EmailTaken` if the email is already registered,
    /// plus any error from [`NewUser::standard`].
    pub async fn create_user(
        &self,
        email: &str,
        password: Option<&str>,
        name: &str,
    ) -> Result<User, AccountError> {
        self.insert(NewUser::standard(email, password, name)?).await
    }

    /// Create a superuser.
    ///
    /// # Errors
    ///
    /// Same as [`AccountService::create_user`].
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AccountError> {
        self.insert(NewUser::superuser(email, password, name)?).await
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AccountError> {
        let user = self.users.create(&new_user).await.map_err(map_conflict)?;
        tracing::info!(user_id = %user.id, superuser = user.is_superuser, "User created");
        Ok(user)
    }

    /// Check credentials and return the user's API token, creating it on
    /// first login.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` if the email is unknown, the
    /// password is wrong, or the account is inactive.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let email = Email::parse(email).map_err(|_| AccountError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.tokens.get_or_create(user.id, &generate_token()).await?;
        tracing::debug!(user_id = %user.id, "Token issued");
        Ok(token)
    }

    /// Resolve an API token to its active user.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the lookup fails.
    pub async fn user_for_token(&self, token: &str) -> Result<Option<User>, AccountError> {
        Ok(self.tokens.get_user_by_key(token).await?)
    }

    /// Update a user's email, name and/or password.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` or `AccountError::WeakPassword`
    /// for invalid values and `AccountError::EmailTaken` if the new email
    /// belongs to another account.
    pub async fn update_profile(
        &self,
        user: &User,
        changes: ProfileChanges<'_>,
    ) -> Result<User, AccountError> {
        let email = changes.email.map(Email::parse).transpose()?;
        let name = changes.name.map(str::trim);
        let password_hash = changes
            .password
            .map(|password| {
                validate_password(password)?;
                hash_password(password)
            })
            .transpose()?;

        self.users
            .update_profile(user.id, email.as_ref(), name, password_hash.as_deref())
            .await
            .map_err(map_conflict)
    }
}

fn map_conflict(err: RepositoryError) -> AccountError {
    match err {
        RepositoryError::Conflict(_) => AccountError::EmailTaken,
        other => AccountError::Repository(other),
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::WeakPassword(format!(
            "ensure this field has at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AccountError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AccountError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AccountError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AccountError::InvalidCredentials)
}

/// Generate a new 40-character hex API token.
fn generate_token() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
