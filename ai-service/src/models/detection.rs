//! Snake identification request/response models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use validator::Validate;

/// Version tag stamped on every response body.
pub const API_VERSION: &str = "1.0.0";

/// Toxin mechanism of a species' venom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenomType {
    Neurotoxic,
    Hemotoxic,
    Cytotoxic,
    Mixed,
    Unknown,
}

impl VenomType {
    /// Map a model-supplied label. Anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "neurotoxic" => VenomType::Neurotoxic,
            "hemotoxic" => VenomType::Hemotoxic,
            "cytotoxic" => VenomType::Cytotoxic,
            "mixed" => VenomType::Mixed,
            _ => VenomType::Unknown,
        }
    }
}

/// Clinical urgency of a bite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl SeverityLevel {
    /// Map a model-supplied label. Anything unrecognized is `Mild`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "moderate" => SeverityLevel::Moderate,
            "severe" => SeverityLevel::Severe,
            "critical" => SeverityLevel::Critical,
            _ => SeverityLevel::Mild,
        }
    }
}

/// Request to identify the snake in an image.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectionRequest {
    /// `http(s)://` URL or `data:` reference.
    pub image_url: String,

    #[serde(default = "default_confidence_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_threshold: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

fn default_confidence_threshold() -> f64 {
    0.7
}

impl DetectionRequest {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            confidence_threshold: default_confidence_threshold(),
            user_id: None,
            session_id: None,
        }
    }
}

/// Everything we report about an identified species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeSpecies {
    pub scientific_name: String,
    pub common_name: String,
    pub family: String,
    pub genus: String,
    pub venom_type: VenomType,
    pub severity: SeverityLevel,
    pub distribution: Vec<String>,
    pub description: String,
    pub first_aid_notes: String,
    pub antivenom_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub species: SnakeSpecies,

    /// 0.0 - 1.0
    pub confidence: f64,

    /// Never populated; kept for response compatibility.
    #[serde(default)]
    pub bounding_box: Option<HashMap<String, f64>>,

    #[serde(default)]
    pub alternative_species: Vec<SnakeSpecies>,

    /// Which backend produced the result (`api_used`, `model`, ...).
    #[serde(default)]
    pub detection_metadata: HashMap<String, Value>,
}

impl DetectionResult {
    /// The backend recorded in `detection_metadata.api_used`.
    pub fn api_used(&self) -> Option<&str> {
        self.detection_metadata
            .get("api_used")
            .and_then(Value::as_str)
    }
}

/// Why a detection failed, for choosing the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any outbound call.
    Rejected,
    /// The image host or the model could not be reached or refused the call.
    Upstream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,

    #[serde(default)]
    pub result: Option<DetectionResult>,

    #[serde(default)]
    pub error: Option<String>,

    /// Seconds.
    pub processing_time: f64,

    pub api_version: String,

    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl DetectionResponse {
    pub fn succeeded(result: DetectionResult, processing_time: f64) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            processing_time,
            api_version: API_VERSION.to_string(),
            failure: None,
        }
    }

    pub fn failed(error: String, kind: FailureKind, processing_time: f64) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            processing_time,
            api_version: API_VERSION.to_string(),
            failure: Some(kind),
        }
    }
}
