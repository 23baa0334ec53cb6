//! Integration tests for the recipe endpoints, including filtering and
//! image upload.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use recipe_box_integration_tests::{
    MEDIA_URL, TestApp, corrupt_jpeg_bytes, ids, image_upload_url, names, png_bytes, recipe_url,
};

const RECIPES_URL: &str = "/api/recipe/recipes";

// ============================================================================
// Access
// ============================================================================

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_auth_required(pool: PgPool) {
    let app = TestApp::new(pool);

    let response = app.json(Method::GET, RECIPES_URL, None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_retrieve_recipes(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let first = app.sample_recipe(&token, json!({})).await;
    let second = app.sample_recipe(&token, json!({})).await;

    let response = app.get(RECIPES_URL, &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), [first, second]);
    assert_eq!(
        response.body[0],
        json!({
            "id": first,
            "title": "Sample recipe",
            "ingredients": [],
            "tags": [],
            "time_minutes": 10,
            "price": "5.00",
            "link": "",
        })
    );
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recipes_limited_to_user(pool: PgPool) {
    let app = TestApp::new(pool);
    let other = app.signup("other@londonappdev.com").await;
    let other_recipe = app.sample_recipe(&other, json!({})).await;
    let token = app.signup("test@londonappdev.com").await;
    let mine = app.sample_recipe(&token, json!({})).await;

    let response = app.get(RECIPES_URL, &token).await;
    assert_eq!(ids(&response.body), [mine]);

    assert_eq!(
        app.get(&recipe_url(other_recipe), &token).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.patch(&recipe_url(other_recipe), &token, json!({"title": "Stolen"}))
            .await
            .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.delete(&recipe_url(other_recipe), &token).await.status,
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Detail & Create
// ============================================================================

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_view_recipe_detail(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let tag = app.sample_tag(&token, "Main course").await;
    let ingredient = app.sample_ingredient(&token, "Cinnamon").await;
    let id = app
        .sample_recipe(&token, json!({"tags": [tag], "ingredients": [ingredient]}))
        .await;

    let response = app.get(&recipe_url(id), &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["tags"], json!([{"id": tag, "name": "Main course"}]));
    assert_eq!(
        response.body["ingredients"],
        json!([{"id": ingredient, "name": "Cinnamon"}])
    );
    assert_eq!(response.body["image"], json!(null));
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_basic_recipe(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;

    let response = app
        .post(
            RECIPES_URL,
            &token,
            json!({"title": "Chocolate cheesecake", "time_minutes": 30, "price": 5.00}),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["title"], "Chocolate cheesecake");
    assert_eq!(response.body["time_minutes"], 30);
    assert_eq!(response.body["price"], "5.00");
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_recipe_with_tags(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let vegan = app.sample_tag(&token, "Vegan").await;
    let dessert = app.sample_tag(&token, "Dessert").await;

    let response = app
        .post(
            RECIPES_URL,
            &token,
            json!({
                "title": "Avocado lime cheesecake",
                "tags": [vegan, dessert],
                "time_minutes": 60,
                "price": "20.00",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let mut tags: Vec<i64> = response.body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(serde_json::Value::as_i64)
        .collect();
    tags.sort_unstable();
    assert_eq!(tags, [vegan, dessert]);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_recipe_with_ingredients(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let prawns = app.sample_ingredient(&token, "Prawns").await;
    let ginger = app.sample_ingredient(&token, "Ginger").await;

    let response = app
        .post(
            RECIPES_URL,
            &token,
            json!({
                "title": "Thai prawn red curry",
                "ingredients": [prawns, ginger],
                "time_minutes": 20,
                "price": 7.00,
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let detail = app
        .get(&recipe_url(response.body["id"].as_i64().unwrap()), &token)
        .await;
    let mut linked = names(&detail.body["ingredients"]);
    linked.sort();
    assert_eq!(linked, ["Ginger", "Prawns"]);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_recipe_unknown_tag(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;

    let response = app
        .post(
            RECIPES_URL,
            &token,
            json!({"title": "Ghost", "time_minutes": 1, "price": "1.00", "tags": [9999]}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.get("tags").is_some(), "{:?}", response.body);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM core.recipe")
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_recipe_invalid_price(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;

    let too_precise = app
        .post(
            RECIPES_URL,
            &token,
            json!({"title": "Cake", "time_minutes": 5, "price": "1.234"}),
        )
        .await;
    let too_large = app
        .post(
            RECIPES_URL,
            &token,
            json!({"title": "Cake", "time_minutes": 5, "price": "1000.00"}),
        )
        .await;

    assert_eq!(too_precise.status, StatusCode::BAD_REQUEST);
    assert!(too_precise.body.get("price").is_some());
    assert_eq!(too_large.status, StatusCode::BAD_REQUEST);
    assert!(too_large.body.get("price").is_some());
}

// ============================================================================
// Update
// ============================================================================

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_partial_update_recipe(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let spicy = app.sample_tag(&token, "Spicy").await;
    let curry = app.sample_tag(&token, "Curry").await;
    let id = app
        .sample_recipe(&token, json!({"tags": [spicy], "link": "https://example.com"}))
        .await;

    let response = app
        .patch(
            &recipe_url(id),
            &token,
            json!({"title": "Chicken tikka", "tags": [curry]}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Chicken tikka");
    assert_eq!(response.body["tags"], json!([curry]));
    assert_eq!(response.body["link"], "https://example.com");
    assert_eq!(response.body["price"], "5.00");
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_patch_without_tags_keeps_them(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let tag = app.sample_tag(&token, "Quick").await;
    let id = app.sample_recipe(&token, json!({"tags": [tag]})).await;

    let response = app.patch(&recipe_url(id), &token, json!({"time_minutes": 15})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["tags"], json!([tag]));
    assert_eq!(response.body["time_minutes"], 15);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_full_update_recipe(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let tag = app.sample_tag(&token, "Spicy").await;
    let id = app
        .sample_recipe(&token, json!({"tags": [tag], "link": "https://example.com"}))
        .await;

    let response = app
        .put(
            &recipe_url(id),
            &token,
            json!({"title": "Spaghetti carbonara", "time_minutes": 25, "price": "5.00"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Spaghetti carbonara");
    assert_eq!(response.body["time_minutes"], 25);
    assert_eq!(response.body["tags"], json!([]));
    assert_eq!(response.body["link"], "");
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_full_update_requires_every_field(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let response = app.put(&recipe_url(id), &token, json!({"title": "Only title"})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.get("time_minutes").is_some(), "{:?}", response.body);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_recipe(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let response = app.delete(&recipe_url(id), &token).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&recipe_url(id), &token).await.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Filtering
// ============================================================================

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_filter_recipes_by_tags(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let vegan = app.sample_tag(&token, "Vegan").await;
    let vegetarian = app.sample_tag(&token, "Vegetarian").await;
    let curry = app
        .sample_recipe(&token, json!({"title": "Thai vegetable curry", "tags": [vegan]}))
        .await;
    let tahini = app
        .sample_recipe(&token, json!({"title": "Aubergine with tahini", "tags": [vegetarian]}))
        .await;
    app.sample_recipe(&token, json!({"title": "Fish and chips"}))
        .await;

    let response = app
        .get(&format!("{RECIPES_URL}?tags={vegan},{vegetarian}"), &token)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), [curry, tahini]);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_filter_recipes_by_ingredients(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let feta = app.sample_ingredient(&token, "Feta cheese").await;
    let chicken = app.sample_ingredient(&token, "Chicken").await;
    let beans = app
        .sample_recipe(&token, json!({"title": "Posh beans on toast", "ingredients": [feta]}))
        .await;
    let cacciatore = app
        .sample_recipe(&token, json!({"title": "Chicken cacciatore", "ingredients": [chicken]}))
        .await;
    app.sample_recipe(&token, json!({"title": "Steak and mushrooms"}))
        .await;

    let response = app
        .get(&format!("{RECIPES_URL}?ingredients={feta},{chicken}"), &token)
        .await;

    assert_eq!(ids(&response.body), [beans, cacciatore]);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_filter_requires_both_criteria(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let vegan = app.sample_tag(&token, "Vegan").await;
    let tofu = app.sample_ingredient(&token, "Tofu").await;
    let both = app
        .sample_recipe(&token, json!({"tags": [vegan], "ingredients": [tofu]}))
        .await;
    app.sample_recipe(&token, json!({"tags": [vegan]})).await;
    app.sample_recipe(&token, json!({"ingredients": [tofu]})).await;

    let response = app
        .get(&format!("{RECIPES_URL}?tags={vegan}&ingredients={tofu}"), &token)
        .await;

    assert_eq!(ids(&response.body), [both]);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_filter_rejects_malformed_ids(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;

    let response = app.get(&format!("{RECIPES_URL}?tags=1,abc"), &token).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Image Upload
// ============================================================================

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upload_image_to_recipe(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let response = app
        .upload(&image_upload_url(id), &token, "image", "photo.png", &png_bytes())
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let url = response.body["image"].as_str().unwrap().to_owned();
    assert!(url.starts_with(&format!("{MEDIA_URL}/uploads/recipe/")), "{url}");
    assert!(url.ends_with(".png"), "{url}");
    assert!(app.media_path(&url).exists());

    let detail = app.get(&recipe_url(id), &token).await;
    assert_eq!(detail.body["image"], url.as_str());
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upload_image_bad_request(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let response = app
        .upload(&image_upload_url(id), &token, "image", "notimage.txt", b"notimage")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.get("image").is_some(), "{:?}", response.body);

    let stored: Option<String> = sqlx::query_scalar("SELECT image FROM core.recipe WHERE id = $1")
        .bind(i32::try_from(id).unwrap())
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_corrupt_upload_keeps_existing_image(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;
    let first = app
        .upload(&image_upload_url(id), &token, "image", "photo.png", &png_bytes())
        .await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    let url = first.body["image"].as_str().unwrap().to_owned();

    let response = app
        .upload(&image_upload_url(id), &token, "image", "broken.jpg", &corrupt_jpeg_bytes())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.get("image").is_some(), "{:?}", response.body);
    assert_eq!(std::fs::read(app.media_path(&url)).unwrap(), png_bytes());

    let detail = app.get(&recipe_url(id), &token).await;
    assert_eq!(detail.body["image"], url.as_str());
    let stored = std::fs::read_dir(app.media_root().join("uploads/recipe"))
        .unwrap()
        .count();
    assert_eq!(stored, 1);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_oversized_upload_payload_too_large(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let response = app
        .upload(&image_upload_url(id), &token, "image", "huge.png", &vec![0; 2 * 1024 * 1024])
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    let stored: Option<String> = sqlx::query_scalar("SELECT image FROM core.recipe WHERE id = $1")
        .bind(i32::try_from(id).unwrap())
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upload_without_file(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let response = app
        .upload(&image_upload_url(id), &token, "photo", "photo.png", &png_bytes())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.get("image").is_some(), "{:?}", response.body);
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_replacing_image_removes_previous_file(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;

    let first = app
        .upload(&image_upload_url(id), &token, "image", "one.png", &png_bytes())
        .await;
    let second = app
        .upload(&image_upload_url(id), &token, "image", "two.png", &png_bytes())
        .await;

    let first_path = app.media_path(first.body["image"].as_str().unwrap());
    let second_path = app.media_path(second.body["image"].as_str().unwrap());
    assert_ne!(first_path, second_path);
    assert!(!first_path.exists());
    assert!(second_path.exists());
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleting_recipe_removes_image(pool: PgPool) {
    let app = TestApp::new(pool);
    let token = app.signup("test@londonappdev.com").await;
    let id = app.sample_recipe(&token, json!({})).await;
    let uploaded = app
        .upload(&image_upload_url(id), &token, "image", "photo.png", &png_bytes())
        .await;
    let path = app.media_path(uploaded.body["image"].as_str().unwrap());
    assert!(path.exists());

    let response = app.delete(&recipe_url(id), &token).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(!path.exists());
}

#[sqlx::test(migrator = "recipe_box_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upload_to_other_users_recipe_not_found(pool: PgPool) {
    let app = TestApp::new(pool);
    let other = app.signup("other@londonappdev.com").await;
    let id = app.sample_recipe(&other, json!({})).await;
    let token = app.signup("test@londonappdev.com").await;

    let response = app
        .upload(&image_upload_url(id), &token, "image", "photo.png", &png_bytes())
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let written = std::fs::read_dir(app.media_root()).unwrap().count();
    assert_eq!(written, 0);
}
