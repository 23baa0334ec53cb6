//! Recipe endpoints.
//!
//! ```text
//! GET    /api/recipe/recipes                    - List (?tags=1,2&ingredients=3)
//! POST   /api/recipe/recipes                    - Create
//! GET    /api/recipe/recipes/{id}               - Detail
//! PUT    /api/recipe/recipes/{id}               - Full update
//! PATCH  /api/recipe/recipes/{id}               - Partial update
//! DELETE /api/recipe/recipes/{id}               - Delete (and its image)
//! POST   /api/recipe/recipes/{id}/upload-image  - Multipart image upload
//! ```

use std::str::FromStr;

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use recipe_box_core::{AssociationFilter, IngredientId, Price, RecipeId, TagId};

use super::extract::{ApiJson, max_length, non_blank, required};
use crate::db::{RecipeRepository, RepositoryError};
use crate::error::{AppError, Result, sentence};
use crate::middleware::RequireAuth;
use crate::models::label::{Ingredient, Tag};
use crate::models::recipe::{NewRecipe, Recipe, RecipeChanges, RecipeDetail};
use crate::services::{MediaStore, RecipeService};
use crate::state::AppState;

/// Maximum title and link length (the width of their columns).
const MAX_TEXT_LENGTH: usize = 255;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

// =============================================================================
// Request / Response Types
// =============================================================================

/// List query parameters: comma-separated ID lists.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Create/update body. Every field is optional here; which ones are required
/// depends on the method.
///
/// `price` is kept as raw JSON so range and precision errors can be reported
/// against the field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Value>,
    pub link: Option<String>,
    pub tags: Option<Vec<TagId>>,
    pub ingredients: Option<Vec<IngredientId>>,
}

/// A recipe in listings and after writes; tags and ingredients as IDs.
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: RecipeId,
    pub title: String,
    pub ingredients: Vec<IngredientId>,
    pub tags: Vec<TagId>,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: recipe.ingredient_ids,
            tags: recipe.tag_ids,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
        }
    }
}

/// A single recipe with nested tags and ingredients.
#[derive(Debug, Serialize)]
pub struct RecipeDetailResponse {
    pub id: RecipeId,
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub tags: Vec<Tag>,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeDetailResponse {
    fn new(detail: RecipeDetail, media: &MediaStore) -> Self {
        let RecipeDetail {
            recipe,
            tags,
            ingredients,
        } = detail;

        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients,
            tags,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image.as_deref().map(|path| media.url_for(path)),
        }
    }
}

/// Result of an image upload.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: RecipeId,
    pub image: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

fn parse_price(value: &Value) -> Result<Price> {
    let parsed = match value {
        Value::Number(number) => Price::from_str(&number.to_string()),
        Value::String(text) => Price::from_str(text),
        _ => return Err(AppError::field("price", "A valid number is required.")),
    };

    parsed.map_err(|e| AppError::field("price", sentence(&e.to_string())))
}

fn validate_title(title: &str) -> Result<String> {
    non_blank("title", title, MAX_TEXT_LENGTH)
}

fn validate_link(link: &str) -> Result<String> {
    max_length("link", link.trim(), MAX_TEXT_LENGTH)
}

/// Validate a body where every writable field must be present. Omitted
/// `link`, `tags` and `ingredients` fall back to empty.
fn validate_new(body: RecipeRequest) -> Result<NewRecipe> {
    let title = validate_title(&required("title", body.title)?)?;
    let time_minutes = required("time_minutes", body.time_minutes)?;
    let price = parse_price(&required("price", body.price)?)?;
    let link = validate_link(body.link.as_deref().unwrap_or_default())?;

    Ok(NewRecipe {
        title,
        time_minutes,
        price,
        link,
        tags: body.tags.unwrap_or_default(),
        ingredients: body.ingredients.unwrap_or_default(),
    })
}

/// Validate a partial update; only supplied fields are checked.
fn validate_changes(body: RecipeRequest) -> Result<RecipeChanges> {
    Ok(RecipeChanges {
        title: body.title.as_deref().map(validate_title).transpose()?,
        time_minutes: body.time_minutes,
        price: body.price.as_ref().map(parse_price).transpose()?,
        link: body.link.as_deref().map(validate_link).transpose()?,
        tags: body.tags,
        ingredients: body.ingredients,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Create the recipe routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipe/recipes", get(list).post(create))
        .route(
            "/api/recipe/recipes/{id}",
            get(show).put(replace).patch(update).delete(destroy),
        )
        .route("/api/recipe/recipes/{id}/upload-image", post(upload_image))
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListParams>,
) -> Result<ApiJson<Vec<RecipeResponse>>> {
    let filter =
        AssociationFilter::from_query(params.tags.as_deref(), params.ingredients.as_deref())?;

    let recipes = RecipeRepository::new(state.pool())
        .list_for_user(user.id, &filter)
        .await?;

    Ok(ApiJson(recipes.into_iter().map(RecipeResponse::from).collect()))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<RecipeRequest>,
) -> Result<(StatusCode, ApiJson<RecipeResponse>)> {
    let recipe = validate_new(body)?;

    let recipe = RecipeRepository::new(state.pool())
        .create(user.id, &recipe)
        .await?;

    Ok((StatusCode::CREATED, ApiJson(recipe.into())))
}

async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<ApiJson<RecipeDetailResponse>> {
    let detail = RecipeRepository::new(state.pool())
        .get_detail(user.id, id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(ApiJson(RecipeDetailResponse::new(detail, state.media())))
}

async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    ApiJson(body): ApiJson<RecipeRequest>,
) -> Result<ApiJson<RecipeResponse>> {
    let changes = RecipeChanges::from(validate_new(body)?);

    let recipe = RecipeRepository::new(state.pool())
        .update(user.id, id, &changes)
        .await?;

    Ok(ApiJson(recipe.into()))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    ApiJson(body): ApiJson<RecipeRequest>,
) -> Result<ApiJson<RecipeResponse>> {
    let changes = validate_changes(body)?;

    let recipe = RecipeRepository::new(state.pool())
        .update(user.id, id, &changes)
        .await?;

    Ok(ApiJson(recipe.into()))
}

async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    RecipeService::new(state.pool(), state.media())
        .delete(user.id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    mut multipart: Multipart,
) -> Result<ApiJson<ImageResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::field(IMAGE_FIELD, "No file was submitted."))?;

    let recipe = RecipeService::new(state.pool(), state.media())
        .upload_image(user.id, id, &filename, &bytes)
        .await?;

    Ok(ApiJson(ImageResponse {
        id: recipe.id,
        image: recipe.image.as_deref().map(|path| state.media().url_for(path)),
    }))
}
