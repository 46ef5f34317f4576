#![allow(dead_code)]

use ai_service::config::AiConfig;
use ai_service::services::init_metrics;
use ai_service::startup::Application;
use ai_service::AppState;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Default configuration: no Gemini credential, so both handlers mock.
    pub async fn spawn() -> Self {
        Self::spawn_with(AiConfig::default()).await
    }

    pub async fn spawn_with(config: AiConfig) -> Self {
        let state = AppState::new(config).expect("Failed to build application state");
        Self::spawn_with_state(state).await
    }

    pub async fn spawn_with_state(state: AppState) -> Self {
        init_metrics();

        let app = Application::build_with_state(state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the liveness endpoint
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        let live_url = format!("{}/health/live", address);
        for _ in 0..50 {
            if client.get(&live_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Configuration pointing both Gemini models at a stand-in server.
pub fn live_config(api_base: &str) -> AiConfig {
    let mut config = AiConfig::default();
    config.gemini.api_key = Some("test-key".to_string());
    config.gemini.vision_model = "gemini-vision-test".to_string();
    config.gemini.chat_model = "gemini-chat-test".to_string();
    config.gemini.api_base = api_base.to_string();
    config
}

/// A `generateContent` reply carrying `text`.
pub fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 100, "candidatesTokenCount": 20 }
    })
}
