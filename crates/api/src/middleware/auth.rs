//! Token authentication extractor.
//!
//! Clients authenticate with `Authorization: Token <key>`, using the key
//! returned by `POST /api/user/token`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::models::user::User;
use crate::services::AccountService;
use crate::state::AppState;

/// Authorization scheme keyword.
const TOKEN_SCHEME: &str = "Token";

/// Extractor that requires a valid API token.
///
/// Rejects with `401 Unauthorized` when the header is missing or malformed,
/// or the token is unknown or belongs to an inactive user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     user.email.to_string()
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_owned())
            })?;

        let key = parse_token_header(header)?;

        let user = AccountService::new(state.pool())
            .user_for_token(key)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token.".to_owned()))?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(user.id.to_string()),
                ..Default::default()
            }));
        });

        Ok(Self(user))
    }
}

/// Extract the key from a `Token <key>` header value.
fn parse_token_header(header: &str) -> Result<&str, AppError> {
    let mut parts = header.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(key), None) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => Ok(key),
        (Some(scheme), None, _) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => Err(
            AppError::Unauthorized("Invalid token header. No credentials provided.".to_owned()),
        ),
        (Some(scheme), Some(_), Some(_)) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => {
            Err(AppError::Unauthorized(
                "Invalid token header. Token string should not contain spaces.".to_owned(),
            ))
        }
        _ => Err(AppError::Unauthorized(
            "Authentication credentials were not provided.".to_owned(),
        )),
    }
}
