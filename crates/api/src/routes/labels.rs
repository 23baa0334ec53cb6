//! Tag and ingredient endpoints.
//!
//! Both kinds are served by the same generic handlers:
//!
//! ```text
//! GET    /api/recipe/{tags|ingredients}        - List (?assigned_only=1)
//! POST   /api/recipe/{tags|ingredients}        - Create
//! GET    /api/recipe/{tags|ingredients}/{id}   - Show
//! PATCH  /api/recipe/{tags|ingredients}/{id}   - Rename (PUT too)
//! DELETE /api/recipe/{tags|ingredients}/{id}   - Delete
//! ```

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use super::extract::{ApiJson, non_blank, required};
use crate::db::{LabelRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::label::{Label, LabelKind};
use crate::state::AppState;

/// Maximum label name length (the width of the `name` column).
const MAX_NAME_LENGTH: usize = 255;

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub assigned_only: Option<String>,
}

/// Create/rename body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LabelRequest {
    pub name: Option<String>,
}

/// Create the routes for one label kind under `/api/recipe/<field>`.
pub fn routes<K: LabelKind>() -> Router<AppState> {
    let collection = format!("/api/recipe/{}", K::FIELD);
    let item = format!("{collection}/{{id}}");

    Router::new()
        .route(&collection, get(list::<K>).post(create::<K>))
        .route(
            &item,
            get(show::<K>)
                .patch(rename::<K>)
                .put(rename::<K>)
                .delete(destroy::<K>),
        )
}

/// Parse the `assigned_only` flag: any non-zero integer enables it.
fn parse_assigned_only(raw: Option<&str>) -> Result<bool> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(false),
        Some(raw) => raw
            .parse::<i32>()
            .map(|flag| flag != 0)
            .map_err(|_| AppError::field("assigned_only", "A valid integer is required.")),
    }
}

async fn list<K: LabelKind>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListParams>,
) -> Result<ApiJson<Vec<Label<K>>>> {
    let assigned_only = parse_assigned_only(params.assigned_only.as_deref())?;

    let labels = LabelRepository::<K>::new(state.pool())
        .list(user.id, assigned_only)
        .await?;

    Ok(ApiJson(labels))
}

async fn create<K: LabelKind>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<LabelRequest>,
) -> Result<(StatusCode, ApiJson<Label<K>>)> {
    let name = non_blank("name", &required("name", body.name)?, MAX_NAME_LENGTH)?;

    let label = LabelRepository::<K>::new(state.pool())
        .create(user.id, &name)
        .await?;

    Ok((StatusCode::CREATED, ApiJson(label)))
}

async fn show<K: LabelKind>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<ApiJson<Label<K>>> {
    let label = LabelRepository::<K>::new(state.pool())
        .get(user.id, K::Id::from(id))
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(ApiJson(label))
}

async fn rename<K: LabelKind>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<LabelRequest>,
) -> Result<ApiJson<Label<K>>> {
    let name = non_blank("name", &required("name", body.name)?, MAX_NAME_LENGTH)?;

    let label = LabelRepository::<K>::new(state.pool())
        .rename(user.id, K::Id::from(id), &name)
        .await?;

    Ok(ApiJson(label))
}

async fn destroy<K: LabelKind>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    LabelRepository::<K>::new(state.pool())
        .delete(user.id, K::Id::from(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
