mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn chat_without_credential_answers_general() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/v1/chat", &json!({ "query": "What do I do if bitten?" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["query_type"], "general");
    assert_eq!(body["confidence"], 0.7);
    assert!(body["emergency_contact"].is_null());
    assert_eq!(
        body["sources"],
        json!(["WHO Guidelines", "CDC Information", "KEMRI Research"])
    );
    assert_eq!(body["follow_up_questions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn emergency_chat_carries_contact_line() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/chat",
            &json!({ "query": "My friend was bitten", "query_type": "emergency", "language": "sw" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["query_type"], "emergency");
    assert_eq!(body["confidence"], 0.9);
    assert_eq!(
        body["emergency_contact"],
        "Emergency Services: 999 (Kenya) | Ambulance: 112 | Police: 911"
    );
}

#[tokio::test]
async fn empty_query_is_unprocessable() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/v1/chat", &json!({ "query": "" })).await;
    assert_eq!(response.status().as_u16(), 422);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation error");
}

#[tokio::test]
async fn overlong_query_is_unprocessable() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/v1/chat", &json!({ "query": "a".repeat(1001) }))
        .await;
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn context_update_is_acknowledged() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/context",
            &json!({
                "user_id": "user-42",
                "session_id": "session-7",
                "conversation_history": [{ "role": "user", "content": "hello" }],
                "user_preferences": { "language": "en" }
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "message": "Context updated successfully",
            "user_id": "user-42",
            "session_id": "session-7"
        })
    );
}

#[tokio::test]
async fn context_requires_ids() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/v1/context", &json!({ "user_id": "", "session_id": "s" }))
        .await;
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn topic_listing() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app.get("/api/v1/topics").await.json().await.unwrap();
    assert_eq!(body["total_categories"], 4);
    assert_eq!(body["supported_languages"], json!(["en", "sw", "fr"]));
    for category in ["emergency_response", "prevention", "species_information", "general"] {
        assert_eq!(body["topics"][category].as_array().unwrap().len(), 4);
    }
}
