use ai_service::config::AiConfig;
use ai_service::services::init_metrics;
use ai_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = AiConfig::load()
        .map_err(|e| std::io::Error::other(format!("Configuration error: {}", e)))?;

    init_tracing("ai-service", &config.log_level, config.otlp_endpoint.as_deref());
    init_metrics();

    tracing::info!(config = ?config, "Loaded configuration");

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
