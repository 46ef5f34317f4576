pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
    trusted_host::{trusted_host_middleware, TrustedHosts},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AiConfig;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::providers::GenerativeProvider;
use crate::services::{ChatbotService, ImageFetcher, SnakeDetectionService};

/// Uploads arrive as multipart bodies; leave room for phone-camera photos.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AiConfig>,
    pub detector: SnakeDetectionService,
    pub chatbot: ChatbotService,
    pub started_at: Instant,
}

impl AppState {
    /// Build handlers from configuration. Without a Gemini credential both
    /// handlers run in mock mode.
    pub fn new(config: AiConfig) -> Result<Self, AppError> {
        let (vision, chat) = match &config.gemini.api_key {
            Some(api_key) => {
                let vision = gemini_provider(&config, api_key, &config.gemini.vision_model)?;
                let chat = gemini_provider(&config, api_key, &config.gemini.chat_model)?;

                tracing::info!(
                    vision_model = %config.gemini.vision_model,
                    chat_model = %config.gemini.chat_model,
                    "Initialized Gemini providers"
                );
                (Some(vision), Some(chat))
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, serving mock responses");
                (None, None)
            }
        };

        Self::with_providers(config, vision, chat)
    }

    /// Build handlers around explicit providers.
    pub fn with_providers(
        config: AiConfig,
        vision: Option<Arc<dyn GenerativeProvider>>,
        chat: Option<Arc<dyn GenerativeProvider>>,
    ) -> Result<Self, AppError> {
        let fetcher = ImageFetcher::new()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

        Ok(Self {
            config: Arc::new(config),
            detector: SnakeDetectionService::new(vision, fetcher),
            chatbot: ChatbotService::new(chat),
            started_at: Instant::now(),
        })
    }
}

fn gemini_provider(
    config: &AiConfig,
    api_key: &str,
    model: &str,
) -> Result<Arc<dyn GenerativeProvider>, AppError> {
    let provider = GeminiProvider::new(GeminiConfig {
        api_key: api_key.to_string(),
        model: model.to_string(),
        api_base: config.gemini.api_base.clone(),
    })
    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

    Ok(Arc::new(provider))
}

/// Credentialed CORS. A literal `*` cannot be combined with credentials,
/// so `*` echoes the request's origin instead.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    let trusted_hosts = TrustedHosts::new(&state.config.security.allowed_hosts);
    let cors = cors_layer(&state.config.security.cors_origins);

    let api = Router::new()
        .route("/predict", post(handlers::detection::predict))
        .route("/upload-and-detect", post(handlers::detection::upload_and_detect))
        .route("/species", get(handlers::detection::species))
        .route("/chat", post(handlers::chat::chat))
        .route("/context", post(handlers::chat::update_context))
        .route("/topics", get(handlers::chat::topics));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/health/live", get(handlers::health::liveness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        // Outermost: untrusted hosts never reach CORS, preflight included
        .layer(from_fn_with_state(trusted_hosts, trusted_host_middleware))
}
