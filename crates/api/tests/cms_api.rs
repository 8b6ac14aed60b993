//! HTTP-level integration tests for the CMS endpoints.
//!
//! Uses `tower::ServiceExt::oneshot` to send requests straight to the router
//! without a TCP listener.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_json, get, post_json, post_json_as, post_raw};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn content(text: &str) -> Value {
    json!({
        "root": { "props": { "title": format!("Page {text}") } },
        "content": [{ "type": "Text", "props": { "text": text } }],
    })
}

async fn save_draft(pool: &PgPool, slug: &str, country: &str, text: &str) -> Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": slug, "country": country, "content": content(text) }),
    )
    .await;
    assert!(response.status().is_success(), "save failed: {}", response.status());
    body_json(response).await
}

async fn publish(pool: &PgPool, slug: &str, country: &str) -> axum::http::Response<axum::body::Body> {
    let app = common::build_test_app(pool.clone());
    post_json(
        app,
        "/api/v1/cms/pages/publish",
        json!({ "slug": slug, "country": country, "remark": "release" }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_reports_database(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

// ---------------------------------------------------------------------------
// Draft lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_draft_creates_then_updates(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json_as(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "/home/", "country": "US", "content": content("A") }),
        "alice",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created"], true);
    assert_eq!(json["data"]["identity"]["slug"], "home");
    assert_eq!(json["data"]["identity"]["country_code"], "us");

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "home", "country": "us", "title": "Welcome", "content": content("B") }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["created"], false);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages/draft?slug=home&country=us").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"]["root"]["props"]["title"], "Welcome");
    assert_eq!(json["data"]["content"]["root"]["props"]["slug"], "home");
    assert_eq!(json["data"]["content"]["content"][0]["props"]["text"], "B");
    assert_eq!(json["data"]["page_info"]["title"], "Welcome");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_draft_rejects_malformed_content(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "home", "content": { "root": {}, "content": "nope" } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_draft_requires_slug(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "  ", "content": content("A") }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "slug is required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_draft_enforces_locale_catalogue(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "home", "country": "us", "language": "ar", "content": content("A") }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut config = common::test_config();
    config.enforce_locales = false;
    let app = common::build_test_app_with(pool, config);
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "home", "country": "us", "language": "ar", "content": content("A") }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_json_uses_error_envelope(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_raw(app, "/api/v1/cms/pages/draft", "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rename_onto_taken_identity_returns_409(pool: PgPool) {
    save_draft(&pool, "x", "ae", "A").await;
    save_draft(&pool, "b", "ae", "B").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({
            "original_slug": "b", "original_country": "ae",
            "slug": "x", "country": "ae",
            "content": content("B2"),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages/draft?slug=b&country=ae").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Publish / rollback
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_publish_rollback_flow(pool: PgPool) {
    save_draft(&pool, "home", "us", "A").await;
    let response = publish(&pool, "home", "us").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["version_num"], 1);

    save_draft(&pool, "home", "us", "B").await;
    let response = publish(&pool, "home", "us").await;
    assert_eq!(body_json(response).await["data"]["version_num"], 2);

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/rollback",
        json!({ "slug": "home", "country": "us", "version_num": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Live content is still v2.
    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/cms/pages/published?slug=home&country=us").await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"][0]["props"]["text"], "B");

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/cms/pages/draft?slug=home&country=us").await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"]["content"][0]["props"]["text"], "A");

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages/versions?slug=home&country=us").await;
    let json = body_json(response).await;
    let versions = json["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version_num"], 2);
    assert_eq!(versions[0]["is_published"], true);
    assert_eq!(versions[1]["is_published"], false);
    assert!(versions[0].get("content").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_publish_empty_draft_returns_422(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/draft",
        json!({ "slug": "blank", "title": "Blank", "content": { "root": {}, "content": [] } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = publish(&pool, "blank", "glo").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_publish_unknown_page_returns_404(pool: PgPool) {
    let response = publish(&pool, "missing", "us").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_published_content_is_null_before_publish(pool: PgPool) {
    save_draft(&pool, "home", "us", "A").await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages/published?slug=home&country=us").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_version_endpoints(pool: PgPool) {
    save_draft(&pool, "home", "us", "A").await;
    publish(&pool, "home", "us").await;
    save_draft(&pool, "home", "us", "B").await;
    publish(&pool, "home", "us").await;

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/cms/pages/versions/1?slug=home&country=us").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"]["content"][0]["props"]["text"], "A");
    assert_eq!(json["data"]["remark"], "release");

    // The live version is guarded.
    let app = common::build_test_app(pool.clone());
    let response = delete_json(
        app,
        "/api/v1/cms/pages/versions/2",
        json!({ "slug": "home", "country": "us" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let app = common::build_test_app(pool.clone());
    let response = delete_json(
        app,
        "/api/v1/cms/pages/versions/1",
        json!({ "slug": "home", "country": "us" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/cms/pages/versions?slug=home&country=us").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let app = common::build_test_app(pool);
    let response = get(
        app,
        "/api/v1/cms/pages/versions?slug=home&country=us&include_deleted=true",
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_numeric_version_is_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages/versions/latest?slug=home").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Page lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_and_restore_page(pool: PgPool) {
    save_draft(&pool, "promo", "ae", "A").await;

    let app = common::build_test_app(pool.clone());
    let response = delete_json(app, "/api/v1/cms/pages", json!({ "slug": "promo", "country": "ae" })).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/cms/pages/draft?slug=promo&country=ae").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/cms/pages/restore",
        json!({ "slug": "promo", "country": "ae" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages/draft?slug=promo&country=ae").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_paginates_and_clamps(pool: PgPool) {
    for i in 0..3 {
        save_draft(&pool, &format!("sale-{i}"), "us", "A").await;
    }
    save_draft(&pool, "about", "us", "A").await;

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/cms/pages?keyword=SALE&page=1&page_size=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["total_pages"], 2);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 2);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages?page=0&page_size=1000").await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["page"], 1);
    assert_eq!(json["data"]["page_size"], 100);
    assert_eq!(json["data"]["total"], 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_far_past_last_page_is_empty(pool: PgPool) {
    save_draft(&pool, "home", "us", "A").await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/cms/pages?page=9223372036854775807&page_size=100").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reconcile_reports_and_repairs(pool: PgPool) {
    save_draft(&pool, "home", "us", "A").await;
    publish(&pool, "home", "us").await;
    sqlx::query("UPDATE cms_page_versions SET is_published = false")
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/cms/maintenance/reconcile", json!({ "dry_run": true })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["issues"][0]["kind"], "pointer_mismatch");

    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/cms/maintenance/reconcile", json!({})).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["pages_repaired"], 1);
    assert_eq!(json["data"]["versions_repaired"], 1);

    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/cms/maintenance/reconcile", json!({ "dry_run": true })).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}
