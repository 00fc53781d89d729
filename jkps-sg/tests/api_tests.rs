//! HTTP API integration tests for jkps-sg
//!
//! Drives the router with `oneshot` against an in-memory database and a
//! temporary image directory.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use jkps_sg::models::Locale;
use jkps_sg::AppState;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::io::Cursor;
use tempfile::TempDir;
use tower::util::ServiceExt;

const DATABASE_CSV: &str = "id,name,description,color\n\
                            JK100,Shirt,Cotton shirt,Red\n\
                            JK200,Coat,Wool coat,Black\n\
                            JK300,Scarf,Silk scarf,Green\n";

/// Test helper: single-connection in-memory database with the production schema
async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    jkps_common::db::create_tables(&pool)
        .await
        .expect("Failed to initialize database schema");
    pool
}

/// Test helper: app over a fresh database and image directory
async fn create_test_app() -> (Router, AppState, TempDir) {
    let pool = create_test_pool().await;
    let images = tempfile::tempdir().expect("Failed to create temp dir");
    let state = AppState::new(pool, images.path().to_path_buf(), Locale::En);
    (jkps_sg::build_router(state.clone()), state, images)
}

fn png(color: [u8; 4]) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba(color)));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

async fn send(app: &Router, method: &str, uri: &str, body: Body, content_type: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, content_type)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let (status, bytes) = send(app, method, uri, body, "application/json").await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn upload_inputs(app: &Router) {
    let (status, body) = send(app, "POST", "/uploads/database", Body::from(DATABASE_CSV), "text/csv").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["records"], 3);

    let (status, body) = send_json(
        app,
        "POST",
        "/uploads/labels",
        Some(json!({
            "files": [
                {"name": "jk100.txt", "content": "JK100\nRenk/Color: Blue\nBeden/Size: M\nBarcode: 8680001\n"},
                {"name": "jk200.txt", "content": "JK200\nColor: Navy\nKalıp: Slim\n"},
                {"name": "blank.txt", "content": "no identifier here"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extracted"], 2);
    assert_eq!(body["misses"], json!(["blank.txt"]));

    let (status, _) = send(
        app,
        "PUT",
        "/uploads/images/JK100_front.png",
        Body::from(png([200, 30, 40, 255])),
        "image/png",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state, _images) = create_test_app().await;

    let (status, json) = send_json(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "jkps-sg");
    assert_eq!(json["pipeline"]["sheets"], 0);
}

#[tokio::test]
async fn test_health_reports_pipeline_counts() {
    let (app, _state, _images) = create_test_app().await;
    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;

    let (_, json) = send_json(&app, "GET", "/health", None).await;

    assert_eq!(
        json["pipeline"],
        json!({
            "locale": "en",
            "database_records": 3,
            "labels": 2,
            "images": 1,
            "mappings": 3,
            "sheets": 0
        })
    );
    assert!(json["last_error"].as_str().unwrap().contains("blank.txt"));
}

#[tokio::test]
async fn test_auto_map_requires_uploads() {
    let (app, _state, _images) = create_test_app().await;

    let (status, json) = send_json(&app, "POST", "/mappings/auto", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert_eq!(json["error"]["message"], "Please upload database and labels first.");
}

#[tokio::test]
async fn test_generate_requires_mappings() {
    let (app, _state, _images) = create_test_app().await;

    let (status, json) = send_json(&app, "POST", "/sheets/generate", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Please map the data first.");
}

#[tokio::test]
async fn test_database_without_id_column_is_rejected() {
    let (app, state, _images) = create_test_app().await;

    let (status, _) = send(&app, "POST", "/uploads/database", Body::from("sku,name\nA,B\n"), "text/csv").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.pipeline.read().await.database().is_none());
}

#[tokio::test]
async fn test_full_flow_generates_sheets() {
    let (app, _state, _images) = create_test_app().await;
    upload_inputs(&app).await;

    let (status, json) = send_json(&app, "POST", "/mappings/auto", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mapped"], 3);
    assert_eq!(json["withLabels"], 2);
    assert_eq!(json["databaseOnly"], 1);
    assert_eq!(json["withImages"], 1);

    let (status, json) = send_json(&app, "POST", "/sheets/generate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["generated"], 3);
    assert_eq!(json["failures"], json!([]));

    let (status, sheet) = send_json(&app, "GET", "/sheets/JK100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sheet["color"], "Blue");
    assert_eq!(sheet["size"], "M");
    assert_eq!(sheet["imageUrl"], "/images/JK100_front.png");
    let description = sheet["description"].as_str().unwrap();
    assert!(description.starts_with("Shirt - Cotton shirt\n"));
    assert!(description.contains("Color: Blue"));
    assert!(description.contains("Size: M"));
    assert!(description.ends_with("Dominant Color: rgb(200, 30, 40)"));

    let (_, sheet) = send_json(&app, "GET", "/sheets/JK300", None).await;
    assert_eq!(sheet["color"], "Green");
    assert_eq!(sheet["imageUrl"], "");
    assert!(sheet["description"].as_str().unwrap().contains("Dominant Color: N/A"));

    let (status, _) = send_json(&app, "GET", "/sheets/JK999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mapping_edit_flows_into_generation() {
    let (app, _state, _images) = create_test_app().await;
    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;

    let (status, json) = send_json(
        &app,
        "PATCH",
        "/mappings/JK300",
        Some(json!({"field": "size", "value": "L"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], "L");

    let (status, _) = send_json(&app, "PATCH", "/mappings/JK300", Some(json!({"field": "id", "value": "JK9"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, "PATCH", "/mappings/JK999", Some(json!({"field": "size", "value": "L"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send_json(&app, "POST", "/sheets/generate", None).await;
    let (_, sheet) = send_json(&app, "GET", "/sheets/JK300", None).await;
    assert!(sheet["description"].as_str().unwrap().contains("Size: L"));
}

#[tokio::test]
async fn test_sheet_edit_and_regenerate() {
    let (app, _state, _images) = create_test_app().await;
    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;
    send_json(&app, "POST", "/sheets/generate", None).await;

    let (status, json) = send_json(
        &app,
        "PATCH",
        "/sheets/JK200",
        Some(json!({"field": "name", "value": "Long coat"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sheet"]["name"], "Long coat");
    assert!(json.get("persistError").is_none());

    let (status, _) = send_json(&app, "PATCH", "/sheets/JK200", Some(json!({"field": "id", "value": "X"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send_json(&app, "POST", "/sheets/JK200/regenerate", None).await;
    assert_eq!(status, StatusCode::OK);
    // Edited field survives, description is rebuilt from the merged record
    assert_eq!(json["sheet"]["name"], "Long coat");
    assert!(json["sheet"]["description"].as_str().unwrap().starts_with("Coat - Wool coat"));

    let (_, again) = send_json(&app, "POST", "/sheets/JK200/regenerate", None).await;
    assert_eq!(again["sheet"]["description"], json["sheet"]["description"]);

    let (status, _) = send_json(&app, "POST", "/sheets/JK999/regenerate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_locale_selection() {
    let (app, state, _images) = create_test_app().await;

    let (_, json) = send_json(&app, "GET", "/settings/locale", None).await;
    assert_eq!(json["locale"], "en");

    let (status, _) = send_json(&app, "PUT", "/settings/locale", Some(json!({"locale": "de"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send_json(&app, "PUT", "/settings/locale", Some(json!({"locale": "tr"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["locale"], "tr");
    assert_eq!(
        jkps_sg::db::settings::get_locale(&state.db).await.unwrap(),
        Some(Locale::Tr)
    );

    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;
    send_json(&app, "POST", "/sheets/generate", None).await;

    let (_, sheet) = send_json(&app, "GET", "/sheets/JK100", None).await;
    let description = sheet["description"].as_str().unwrap();
    assert!(description.contains("Renk: Blue"));
    assert!(description.contains("Beden: M"));
    assert!(description.contains("Ana Renk: rgb(200, 30, 40)"));
}

#[tokio::test]
async fn test_export_formats() {
    let (app, _state, _images) = create_test_app().await;

    let (status, json) = send_json(&app, "GET", "/export/json", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "No product sheets to export.");

    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;
    send_json(&app, "POST", "/sheets/generate", None).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/export/json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"product_sheets.json\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let restored = jkps_sg::services::from_json(&text).unwrap();
    assert_eq!(restored.len(), 3);

    let (status, bytes) = send(&app, "GET", "/export/csv", Body::empty(), "text/plain").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("id,name,description,color,size,drop,kalip,composition,care,barcode,fullText,imageUrl\n"));

    let (status, bytes) = send(&app, "GET", "/export/google-sheets", Body::empty(), "text/plain").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(bytes).unwrap().starts_with("JK100,Shirt,"));

    let (status, _) = send(&app, "GET", "/export/xlsx", Body::empty(), "text/plain").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_load_restores_persisted_sheets() {
    let (app, state, _images) = create_test_app().await;
    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;
    send_json(&app, "POST", "/sheets/generate", None).await;

    // Fresh session over the same database
    let images = tempfile::tempdir().unwrap();
    let fresh = AppState::new(state.db.clone(), images.path().to_path_buf(), Locale::En);
    let fresh_app = jkps_sg::build_router(fresh);

    let (_, json) = send_json(&fresh_app, "GET", "/sheets", None).await;
    assert_eq!(json, json!({}));

    let (status, json) = send_json(&fresh_app, "POST", "/sheets/load", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["loaded"], 3);

    let (_, sheet) = send_json(&fresh_app, "GET", "/sheets/JK100", None).await;
    assert_eq!(sheet["color"], "Blue");
}

#[tokio::test]
async fn test_single_sheet_reads_through_store() {
    let (app, state, _images) = create_test_app().await;
    upload_inputs(&app).await;
    send_json(&app, "POST", "/mappings/auto", None).await;
    send_json(&app, "POST", "/sheets/generate", None).await;

    let images = tempfile::tempdir().unwrap();
    let fresh = AppState::new(state.db.clone(), images.path().to_path_buf(), Locale::En);
    let fresh_app = jkps_sg::build_router(fresh.clone());

    let (status, sheet) = send_json(&fresh_app, "GET", "/sheets/JK200", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sheet["color"], "Navy");
    assert_eq!(fresh.pipeline.read().await.sheets().len(), 1);

    // Cached sheet is editable without a reload
    let (status, _) = send_json(
        &fresh_app,
        "PATCH",
        "/sheets/JK200",
        Some(json!({"field": "size", "value": "XL"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send_json(&fresh_app, "GET", "/sheets/JK999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_superseded_image_is_deleted_and_current_is_served() {
    let (app, _state, images) = create_test_app().await;

    send(&app, "PUT", "/uploads/images/JK100_a.png", Body::from(png([1, 1, 1, 255])), "image/png").await;
    assert!(images.path().join("JK100_a.png").exists());

    let (status, body) = send(&app, "PUT", "/uploads/images/JK100_b.png", Body::from(png([2, 2, 2, 255])), "image/png").await;
    assert_eq!(status, StatusCode::OK);
    let reference: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reference["url"], "/images/JK100_b.png");

    assert!(!images.path().join("JK100_a.png").exists());
    assert!(images.path().join("JK100_b.png").exists());

    let (status, served) = send(&app, "GET", "/images/JK100_b.png", Body::empty(), "text/plain").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, png([2, 2, 2, 255]));
}

#[tokio::test]
async fn test_image_without_identifier_is_rejected() {
    let (app, _state, _images) = create_test_app().await;

    let (status, _) = send(&app, "PUT", "/uploads/images/_front.png", Body::from(png([0, 0, 0, 255])), "image/png").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
