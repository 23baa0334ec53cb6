//! User account and token endpoints.
//!
//! ```text
//! POST      /api/user/create  - Register
//! POST      /api/user/token   - Exchange credentials for an API token
//! GET       /api/user/me      - Current user
//! PUT/PATCH /api/user/me      - Update current user
//! ```

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::extract::{ApiJson, required};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::user::User;
use crate::services::AccountService;
use crate::services::accounts::ProfileChanges;
use crate::state::AppState;

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email.into_inner(),
            name: user.name,
        }
    }
}

/// Registration and profile update body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Login body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Issued API token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create the user routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/create", post(create))
        .route("/api/user/token", post(token))
        .route("/api/user/me", get(me).put(replace_me).patch(update_me))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UserRequest>,
) -> Result<(StatusCode, ApiJson<UserResponse>)> {
    let email = required("email", body.email)?;
    let password = required("password", body.password)?;
    let name = body.name.unwrap_or_default();

    let user = AccountService::new(state.pool())
        .create_user(&email, Some(&password), &name)
        .await?;

    Ok((StatusCode::CREATED, ApiJson(user.into())))
}

async fn token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> Result<ApiJson<TokenResponse>> {
    let email = required("email", body.email)?;
    let password = required("password", body.password)?;

    let token = AccountService::new(state.pool())
        .authenticate(&email, &password)
        .await?;

    Ok(ApiJson(TokenResponse { token }))
}

async fn me(RequireAuth(user): RequireAuth) -> ApiJson<UserResponse> {
    ApiJson(user.into())
}

async fn replace_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<UserRequest>,
) -> Result<ApiJson<UserResponse>> {
    let email = required("email", body.email)?;
    let password = required("password", body.password)?;
    let name = required("name", body.name)?;

    let changes = ProfileChanges {
        email: Some(&email),
        name: Some(&name),
        password: Some(&password),
    };
    let user = AccountService::new(state.pool())
        .update_profile(&user, changes)
        .await?;

    Ok(ApiJson(user.into()))
}

async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<UserRequest>,
) -> Result<ApiJson<UserResponse>> {
    let changes = ProfileChanges {
        email: body.email.as_deref(),
        name: body.name.as_deref(),
        password: body.password.as_deref(),
    };
    let user = AccountService::new(state.pool())
        .update_profile(&user, changes)
        .await?;

    Ok(ApiJson(user.into()))
}
