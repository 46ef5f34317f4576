//! Chatbot request/response models.

use super::detection::API_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use validator::Validate;

/// Topic a chatbot query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    FirstAid,
    Prevention,
    SpeciesInfo,
    Emergency,
    General,
}

impl QueryType {
    pub const ALL: [QueryType; 5] = [
        QueryType::FirstAid,
        QueryType::Prevention,
        QueryType::SpeciesInfo,
        QueryType::Emergency,
        QueryType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::FirstAid => "first_aid",
            QueryType::Prevention => "prevention",
            QueryType::SpeciesInfo => "species_info",
            QueryType::Emergency => "emergency",
            QueryType::General => "general",
        }
    }

    /// Parse a category token such as the classifier's reply.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatQuery {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    /// Explicit category; classified when absent.
    #[serde(default)]
    pub query_type: Option<QueryType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, Value>>,
}

fn default_language() -> String {
    "en".to_string()
}

impl ChatQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            query_type: None,
            user_id: None,
            session_id: None,
            language: default_language(),
            context: None,
        }
    }

    pub fn with_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    /// Resolved category.
    pub query_type: QueryType,
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    /// Seconds.
    pub processing_time: f64,
    pub api_version: String,
}

impl ChatReply {
    /// Apology reply used when generation fails.
    pub fn failed(error: &str, processing_time: f64) -> Self {
        Self {
            success: false,
            response: format!(
                "I apologize, but I encountered an error processing your query: {}",
                error
            ),
            query_type: QueryType::General,
            confidence: 0.0,
            sources: Vec::new(),
            follow_up_questions: Vec::new(),
            emergency_contact: None,
            processing_time,
            api_version: API_VERSION.to_string(),
        }
    }
}

/// Conversation context pushed by clients. Acknowledged, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatContext {
    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(length(min = 1))]
    pub session_id: String,

    #[serde(default)]
    pub conversation_history: Vec<HashMap<String, String>>,

    #[serde(default)]
    pub user_preferences: HashMap<String, Value>,

    #[serde(default)]
    pub location_context: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAck {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub session_id: String,
}
