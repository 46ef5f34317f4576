use service_core::config::{self as core_config, get_env, get_optional_env, parse_list};
use service_core::error::AppError;

/// Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Service configuration. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub common: core_config::Config,
    pub version: String,
    pub gemini: GeminiSettings,
    pub detection: DetectionSettings,
    pub security: SecuritySettings,
    /// Requests per minute. Published for operators; not enforced.
    pub rate_limit_per_minute: u32,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone)]
pub struct GeminiSettings {
    /// `None` puts both handlers in mock mode.
    pub api_key: Option<String>,
    /// Model for chat replies and query classification.
    pub chat_model: String,
    /// Model for image identification.
    pub vision_model: String,
    pub api_base: String,
}

// Keep the key out of logs.
impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("chat_model", &self.chat_model)
            .field("vision_model", &self.vision_model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// Threshold applied to uploads and used when the model omits `confidence`.
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub allowed_hosts: Vec<String>,
    pub cors_origins: Vec<String>,
}

impl AiConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let confidence_threshold = parse_threshold(&get_env(
            "VISION_CONFIDENCE_THRESHOLD",
            Some(&DEFAULT_CONFIDENCE_THRESHOLD.to_string()),
            is_prod,
        )?)?;

        Ok(AiConfig {
            common: common_config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            gemini: GeminiSettings {
                api_key: get_optional_env("GEMINI_API_KEY"),
                chat_model: get_env("GEMINI_MODEL", Some("gemini-1.5-pro"), is_prod)?,
                vision_model: get_env("GEMINI_VISION_MODEL", Some("gemini-1.5-pro"), is_prod)?,
                api_base: get_optional_env("GEMINI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            },
            detection: DetectionSettings {
                confidence_threshold,
            },
            security: SecuritySettings {
                allowed_hosts: parse_list(&get_env("ALLOWED_HOSTS", Some("*"), is_prod)?),
                cors_origins: parse_list(&get_env(
                    "CORS_ORIGINS",
                    Some("http://localhost:3000,http://localhost:3001"),
                    is_prod,
                )?),
            },
            rate_limit_per_minute: parse_rate_limit(&get_env(
                "RATE_LIMIT_PER_MINUTE",
                Some(&DEFAULT_RATE_LIMIT_PER_MINUTE.to_string()),
                is_prod,
            )?)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
        })
    }

    /// Whether a Gemini credential is configured. Without one every handler
    /// answers from static data.
    pub fn has_credential(&self) -> bool {
        self.gemini.api_key.is_some()
    }
}

/// `VISION_CONFIDENCE_THRESHOLD`, clamped to `0.0..=1.0`.
fn parse_threshold(raw: &str) -> Result<f64, AppError> {
    let value = raw.trim().parse::<f64>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "VISION_CONFIDENCE_THRESHOLD must be a number: {}",
            e
        ))
    })?;

    if !value.is_finite() {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "VISION_CONFIDENCE_THRESHOLD must be finite"
        )));
    }

    Ok(value.clamp(0.0, 1.0))
}

fn parse_rate_limit(raw: &str) -> Result<u32, AppError> {
    raw.trim().parse::<u32>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "RATE_LIMIT_PER_MINUTE must be a non-negative integer: {}",
            e
        ))
    })
}

impl Default for AiConfig {
    /// Development defaults with no credential (mock mode) and a random port.
    fn default() -> Self {
        AiConfig {
            common: core_config::Config { port: 0 },
            version: env!("CARGO_PKG_VERSION").to_string(),
            gemini: GeminiSettings {
                api_key: None,
                chat_model: "gemini-1.5-pro".to_string(),
                vision_model: "gemini-1.5-pro".to_string(),
                api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            },
            detection: DetectionSettings {
                confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            },
            security: SecuritySettings {
                allowed_hosts: vec!["*".to_string()],
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:3001".to_string(),
                ],
            },
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}
