//! Snake identification from an image.
//!
//! One vision-model call per request. The reply is expected to be a strict
//! JSON object; anything unparseable degrades to the static mock species,
//! while transport failures are reported to the caller.

use crate::models::{
    DetectionRequest, DetectionResponse, DetectionResult, FailureKind, SeverityLevel,
    SnakeSpecies, VenomType,
};
use crate::services::image::{
    decode_data_url, DataUrlError, ImageData, ImageFetchError, ImageFetcher, ImageReference,
};
use crate::services::metrics;
use crate::services::providers::{
    generate_recorded, GenerationParams, GenerativeProvider, PromptPart, ProviderError,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Instruction sent alongside the image.
pub const DETECTION_PROMPT: &str = r#"Analyze this image and identify if it contains a snake. If it does, provide detailed information about the snake species.

Focus on snakes commonly found in Sub-Saharan Africa, particularly Kenya.

IMPORTANT: You must respond with ONLY valid JSON in this exact format:
{
    "scientific_name": "string",
    "common_name": "string",
    "family": "string",
    "genus": "string",
    "venom_type": "neurotoxic|hemotoxic|cytotoxic|mixed|unknown",
    "severity": "mild|moderate|severe|critical",
    "distribution": ["string"],
    "description": "string",
    "first_aid_notes": "string",
    "antivenom_available": true,
    "confidence": 0.85
}

If no snake is detected, return:
{
    "scientific_name": "Unknown",
    "common_name": "No snake detected",
    "family": "Unknown",
    "genus": "Unknown",
    "venom_type": "unknown",
    "severity": "mild",
    "distribution": [],
    "description": "No snake detected in image",
    "first_aid_notes": "No action required",
    "antivenom_available": false,
    "confidence": 0.0
}

Respond with ONLY the JSON, no other text."#;

const RAW_RESPONSE_PREVIEW_CHARS: usize = 200;
const MOCK_CONFIDENCE: f64 = 0.85;

/// Detection failures, split into two tiers.
///
/// `MalformedReply` is the degraded tier: the model answered but the answer
/// was unusable, and the caller gets the mock species. Every other variant is
/// surfaced as a failed response.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("image_url must be a valid HTTP/HTTPS URL or data URL")]
    InvalidReference,

    #[error("Invalid embedded image: {0}")]
    InvalidEmbeddedImage(#[from] DataUrlError),

    #[error("Image download failed: {0}")]
    ImageFetch(#[from] ImageFetchError),

    #[error("External API error (Gemini): {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed model reply: {0}")]
    MalformedReply(String),
}

impl DetectionError {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DetectionError::MalformedReply(_))
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            DetectionError::InvalidReference | DetectionError::InvalidEmbeddedImage(_) => {
                FailureKind::Rejected
            }
            _ => FailureKind::Upstream,
        }
    }
}

#[derive(Clone)]
pub struct SnakeDetectionService {
    provider: Option<Arc<dyn GenerativeProvider>>,
    fetcher: ImageFetcher,
}

impl SnakeDetectionService {
    /// `provider = None` means no credential: every valid request gets the
    /// mock species.
    pub fn new(provider: Option<Arc<dyn GenerativeProvider>>, fetcher: ImageFetcher) -> Self {
        Self { provider, fetcher }
    }

    /// Identify the snake in `request.image_url`. Never fails; errors are
    /// reported through `success`/`error`.
    pub async fn detect(&self, request: &DetectionRequest) -> DetectionResponse {
        let start = Instant::now();

        tracing::info!(
            image = %preview(&request.image_url, 80),
            threshold = request.confidence_threshold,
            user_id = request.user_id.as_deref().unwrap_or("-"),
            session_id = request.session_id.as_deref().unwrap_or("-"),
            "Starting snake detection"
        );

        match self.identify(request).await {
            Ok(result) => {
                let source = result.api_used().unwrap_or("unknown").to_string();
                metrics::record_detection(&source);

                tracing::info!(
                    species = %result.species.scientific_name,
                    confidence = result.confidence,
                    source = %source,
                    "Snake detection completed"
                );

                DetectionResponse::succeeded(result, start.elapsed().as_secs_f64())
            }
            Err(e) => {
                metrics::record_detection("failed");
                tracing::error!(error = %e, "Snake detection failed");

                DetectionResponse::failed(
                    e.to_string(),
                    e.failure_kind(),
                    start.elapsed().as_secs_f64(),
                )
            }
        }
    }

    async fn identify(&self, request: &DetectionRequest) -> Result<DetectionResult, DetectionError> {
        let reference =
            ImageReference::parse(&request.image_url).ok_or(DetectionError::InvalidReference)?;

        let Some(provider) = &self.provider else {
            tracing::warn!("No Gemini API key configured, using mock detection result");
            return Ok(mock_detection_result(None));
        };

        let image = match reference {
            ImageReference::Embedded(data_url) => decode_data_url(data_url)?,
            ImageReference::Remote(url) => self.fetcher.fetch(url).await?,
        };

        let content = self.ask_model(provider.as_ref(), image).await?;

        match parse_detection_reply(&content, request.confidence_threshold, provider.model()) {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    response_preview = %preview(&content, RAW_RESPONSE_PREVIEW_CHARS),
                    "Failed to parse Gemini response, falling back to mock result"
                );
                Ok(mock_detection_result(Some(e.to_string())))
            }
        }
    }

    async fn ask_model(
        &self,
        provider: &dyn GenerativeProvider,
        image: ImageData,
    ) -> Result<String, DetectionError> {
        let parts = [
            PromptPart::text(DETECTION_PROMPT),
            PromptPart::Image {
                mime_type: image.mime_type,
                data: image.data,
            },
        ];
        let params = GenerationParams {
            json_output: true,
            ..Default::default()
        };

        let reply = generate_recorded(provider, &parts, &params).await?;
        tracing::info!(
            model = %provider.model(),
            response_length = reply.text.len(),
            "Gemini API response received"
        );

        Ok(reply.text)
    }
}

/// Strip a surrounding Markdown code fence (```json ... ``` or ``` ... ```).
/// Text without a leading fence is only trimmed.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag, if any.
    let body = match rest.find('\n') {
        Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[idx + 1..]
        }
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    // First closing fence; anything after it is commentary.
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Turn the model's reply into a typed result.
///
/// Missing keys take conservative placeholders; `confidence` falls back to
/// `fallback_confidence` and is clamped to `0.0..=1.0`.
pub fn parse_detection_reply(
    content: &str,
    fallback_confidence: f64,
    model: &str,
) -> Result<DetectionResult, DetectionError> {
    let cleaned = strip_code_fences(content);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| DetectionError::MalformedReply(format!("invalid JSON: {}", e)))?;

    let data = value
        .as_object()
        .ok_or_else(|| DetectionError::MalformedReply("expected a JSON object".to_string()))?;

    let species = SnakeSpecies {
        scientific_name: string_field(data, "scientific_name", "Unknown"),
        common_name: string_field(data, "common_name", "Unknown"),
        family: string_field(data, "family", "Unknown"),
        genus: string_field(data, "genus", "Unknown"),
        venom_type: data
            .get("venom_type")
            .and_then(Value::as_str)
            .map(VenomType::from_label)
            .unwrap_or(VenomType::Unknown),
        severity: data
            .get("severity")
            .and_then(Value::as_str)
            .map(SeverityLevel::from_label)
            .unwrap_or(SeverityLevel::Mild),
        distribution: distribution_field(data),
        description: string_field(data, "description", "No description available"),
        first_aid_notes: string_field(data, "first_aid_notes", "Seek immediate medical attention"),
        antivenom_available: data
            .get("antivenom_available")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };

    let confidence = data
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(fallback_confidence)
        .clamp(0.0, 1.0);

    let mut metadata = HashMap::new();
    metadata.insert("api_used".to_string(), json!("gemini"));
    metadata.insert("model".to_string(), json!(model));
    metadata.insert(
        "raw_response".to_string(),
        json!(preview(content, RAW_RESPONSE_PREVIEW_CHARS)),
    );

    Ok(DetectionResult {
        species,
        confidence,
        bounding_box: None,
        alternative_species: Vec::new(),
        detection_metadata: metadata,
    })
}

/// Static Black Mamba result used without a credential, or when the live
/// reply could not be parsed (`fallback_reason` is then recorded).
pub fn mock_detection_result(fallback_reason: Option<String>) -> DetectionResult {
    let species = SnakeSpecies {
        scientific_name: "Dendroaspis polylepis".to_string(),
        common_name: "Black Mamba".to_string(),
        family: "Elapidae".to_string(),
        genus: "Dendroaspis".to_string(),
        venom_type: VenomType::Neurotoxic,
        severity: SeverityLevel::Critical,
        distribution: vec!["East Africa".to_string(), "Southern Africa".to_string()],
        description: "Large, fast, highly venomous snake with dark coloration".to_string(),
        first_aid_notes:
            "Keep victim calm, immobilize affected limb, seek immediate medical attention"
                .to_string(),
        antivenom_available: true,
    };

    let mut metadata = HashMap::new();
    metadata.insert("api_used".to_string(), json!("mock"));
    metadata.insert("model".to_string(), json!("mock-model"));
    match fallback_reason {
        Some(reason) => {
            metadata.insert(
                "note".to_string(),
                json!("Mock response - model reply could not be parsed"),
            );
            metadata.insert("fallback_reason".to_string(), json!(reason));
        }
        None => {
            metadata.insert(
                "note".to_string(),
                json!("Mock response - no API key configured"),
            );
        }
    }

    DetectionResult {
        species,
        confidence: MOCK_CONFIDENCE,
        bounding_box: None,
        alternative_species: Vec::new(),
        detection_metadata: metadata,
    }
}

fn string_field(data: &Map<String, Value>, key: &str, default: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn distribution_field(data: &Map<String, Value>) -> Vec<String> {
    match data.get("distribution") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(region)) if !region.trim().is_empty() => {
            vec![region.trim().to_string()]
        }
        _ => Vec::new(),
    }
}

/// First `max_chars` characters, with `...` appended when truncated.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
