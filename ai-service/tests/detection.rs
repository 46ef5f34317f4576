mod common;

use common::TestApp;
use reqwest::multipart::{Form, Part};
use serde_json::json;

#[tokio::test]
async fn predict_without_credential_returns_mock_species() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/predict",
            &json!({ "image_url": "https://images.test/snake.jpg", "user_id": "u-1" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["api_version"], "1.0.0");
    assert_eq!(body["result"]["species"]["common_name"], "Black Mamba");
    assert_eq!(body["result"]["species"]["venom_type"], "neurotoxic");
    assert_eq!(body["result"]["species"]["severity"], "critical");
    assert_eq!(body["result"]["detection_metadata"]["api_used"], "mock");
    assert!(body["result"]["alternative_species"].as_array().unwrap().is_empty());
    assert!(body["result"]["bounding_box"].is_null());
}

#[tokio::test]
async fn predict_rejects_unsupported_reference() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/v1/predict", &json!({ "image_url": "ftp://images.test/a.jpg" }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["result"].is_null());
    assert!(body["error"].as_str().unwrap().contains("HTTP/HTTPS URL or data URL"));
}

#[tokio::test]
async fn predict_rejects_out_of_range_threshold() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/predict",
            &json!({ "image_url": "https://images.test/a.jpg", "confidence_threshold": 1.5 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn upload_and_detect_accepts_multipart_image() {
    let app = TestApp::spawn().await;

    let image = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("snake.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = Form::new()
        .part("image", image)
        .text("userId", "user-42")
        .text("sessionId", "session-7")
        .text("location", "Nairobi");

    let response = app
        .client
        .post(app.url("/api/v1/upload-and-detect"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["species"]["scientific_name"], "Dendroaspis polylepis");
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("userId", "user-42")
        .text("sessionId", "session-7");

    let response = app
        .client
        .post(app.url("/api/v1/upload-and-detect"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing image file");
}

#[tokio::test]
async fn species_listing() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app.get("/api/v1/species").await.json().await.unwrap();
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["species"][0]["common_name"], "Black Mamba");
    assert_eq!(body["species"][2]["scientific_name"], "Naja haje");
    assert_eq!(
        body["supported_regions"],
        json!(["East Africa", "Southern Africa", "West Africa"])
    );
}
