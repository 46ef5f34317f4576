//! Snakebite first-aid and prevention chatbot.
//!
//! Every category shares one prompt template; what differs per category
//! (topical instruction, mock answer, follow-ups) lives in [`CategoryProfile`].

use crate::models::{ChatQuery, ChatReply, QueryType, API_VERSION};
use crate::services::metrics;
use crate::services::providers::{
    generate_recorded, GenerationParams, GenerativeProvider, PromptPart, ProviderError,
};
use std::sync::Arc;
use std::time::Instant;

/// Sent ahead of every live generation.
pub const KNOWLEDGE_PREAMBLE: &str = "You are a medical AI assistant specializing in snakebite emergency response and prevention.
Your knowledge is based on verified medical sources including:
- World Health Organization (WHO) Guidelines for Snakebite Prevention and Treatment
- Centers for Disease Control and Prevention (CDC) Snakebite Information
- Kenya Medical Research Institute (KEMRI) Research Data

Key principles:
1. Always prioritize immediate medical attention for snakebites
2. Provide evidence-based first aid guidance
3. Never provide specific medical diagnoses or treatments
4. Always recommend contacting emergency services
5. Focus on prevention and awareness

Emergency contacts for Kenya:
- Emergency Services: 999
- Ambulance: 112
- Police: 911";

const FORMATTING_DIRECTIVES: &str = "IMPORTANT: Format your response with clean, professional structure:
- Use clear section headers without any special characters (e.g., \"General Characteristics\", \"Venom Types\", \"Prevention\")
- Use bullet points (•) for lists
- Use numbered lists (1., 2., 3.) for step-by-step instructions
- Separate different topics with double line breaks
- Keep paragraphs concise and readable
- NEVER use asterisks (*) or any markdown formatting symbols
- Write in a professional, medical tone
- Examples of clean headers: \"General Characteristics\", \"Venom Types\", \"Emergency Response\"
- Do not use any formatting symbols like *, **, or other special characters";

pub const SOURCES: [&str; 3] = ["WHO Guidelines", "CDC Information", "KEMRI Research"];

pub const EMERGENCY_CONTACT: &str =
    "Emergency Services: 999 (Kenya) | Ambulance: 112 | Police: 911";

/// Confidence reported for live replies.
const LIVE_CONFIDENCE: f64 = 0.85;

/// Static per-category data.
pub struct CategoryProfile {
    pub query_type: QueryType,
    /// Category-specific paragraph of the prompt.
    pub instruction: &'static str,
    pub mock_response: &'static str,
    pub mock_confidence: f64,
    pub follow_ups: [&'static str; 3],
}

static PROFILES: [CategoryProfile; 5] = [
    CategoryProfile {
        query_type: QueryType::Emergency,
        instruction: "This is an EMERGENCY query about snakebites. Provide immediate first aid guidance\nand strongly emphasize calling emergency services (999 in Kenya).",
        mock_response: "🚨 EMERGENCY: If you've been bitten by a snake, call 999 immediately! Keep the victim calm, immobilize the affected limb, and get to the nearest hospital with antivenom. Do NOT apply a tourniquet or try to suck out the venom.",
        mock_confidence: 0.9,
        follow_ups: [
            "What should I do if I can't reach emergency services?",
            "How long do I have to get medical help?",
            "What are the signs of a serious snakebite?",
        ],
    },
    CategoryProfile {
        query_type: QueryType::FirstAid,
        instruction: "Provide detailed first aid guidance for snakebites based on WHO guidelines.\nInclude step-by-step instructions and what NOT to do.",
        mock_response: "First Aid for Snakebites:\n1. Keep the victim calm and still\n2. Remove jewelry or tight clothing near the bite\n3. Immobilize the affected limb\n4. Call emergency services (999)\n5. Do NOT apply ice, cut the wound, or use a tourniquet\n6. Seek immediate medical attention",
        mock_confidence: 0.85,
        follow_ups: [
            "Should I try to suck out the venom?",
            "How do I keep the victim calm?",
            "What if the bite is on the face or neck?",
        ],
    },
    CategoryProfile {
        query_type: QueryType::Prevention,
        instruction: "Provide prevention tips and awareness information about snakebites.\nFocus on practical advice for avoiding snake encounters.",
        mock_response: "Snakebite Prevention Tips:\n1. Wear boots and long pants when walking in snake-prone areas\n2. Use a flashlight at night\n3. Avoid tall grass and rocky areas\n4. Keep your yard clean and free of debris\n5. Be cautious when moving rocks or logs\n6. Learn to identify local venomous snakes",
        mock_confidence: 0.8,
        follow_ups: [
            "What should I wear in snake-prone areas?",
            "How can I make my home snake-proof?",
            "What time of day are snakes most active?",
        ],
    },
    CategoryProfile {
        query_type: QueryType::SpeciesInfo,
        instruction: "Provide information about specific snake species, their characteristics,\nvenom types, and geographic distribution in Africa.",
        mock_response: "Common venomous snakes in Kenya include the Black Mamba, Puff Adder, and Egyptian Cobra. Each has different venom types and requires specific antivenom. For detailed species information, consult with local wildlife experts or medical professionals.",
        mock_confidence: 0.75,
        follow_ups: [
            "Which snakes are most dangerous in Kenya?",
            "How can I identify venomous vs non-venomous snakes?",
            "What snakes are found in urban areas?",
        ],
    },
    CategoryProfile {
        query_type: QueryType::General,
        instruction: "Provide helpful information about snakebites, safety, and emergency response.",
        mock_response: "I'm here to help with snakebite-related questions. I can provide information about prevention, first aid, emergency response, and snake species. What would you like to know?",
        mock_confidence: 0.7,
        follow_ups: [
            "How can I learn more about snakebite prevention?",
            "What should I do if I see a snake?",
            "Where can I find more resources?",
        ],
    },
];

/// Static data for `query_type`.
pub fn profile(query_type: QueryType) -> &'static CategoryProfile {
    // PROFILES covers every variant; General is the last entry.
    PROFILES
        .iter()
        .find(|p| p.query_type == query_type)
        .unwrap_or(&PROFILES[PROFILES.len() - 1])
}

/// Build the generation prompt for `query` in `query_type`.
pub fn build_prompt(query: &ChatQuery, query_type: QueryType) -> String {
    format!(
        "User query: {}\nLanguage: {}\n\n{}\n\n{}",
        query.query,
        query.language,
        profile(query_type).instruction,
        FORMATTING_DIRECTIVES
    )
}

/// Prompt asking the model for a single category token.
pub fn classification_prompt(query: &str) -> String {
    format!(
        "Classify this snakebite-related query into one of these categories:
- first_aid: Questions about immediate first aid for snakebites
- prevention: Questions about preventing snakebites
- species_info: Questions about specific snake species
- emergency: Urgent medical questions requiring immediate attention
- general: General questions about snakes or snakebites

Query: \"{}\"

Return only the category name.",
        query
    )
}

/// Emergency contact line; only the emergency category carries one.
pub fn emergency_contact(query_type: QueryType) -> Option<String> {
    (query_type == QueryType::Emergency).then(|| EMERGENCY_CONTACT.to_string())
}

pub fn follow_up_questions(query_type: QueryType) -> Vec<String> {
    profile(query_type)
        .follow_ups
        .iter()
        .map(|q| q.to_string())
        .collect()
}

#[derive(Clone)]
pub struct ChatbotService {
    provider: Option<Arc<dyn GenerativeProvider>>,
}

impl ChatbotService {
    /// `provider = None` means no credential: replies come from static text.
    pub fn new(provider: Option<Arc<dyn GenerativeProvider>>) -> Self {
        Self { provider }
    }

    /// Answer a query. Never fails; generation errors come back as an apology
    /// with `success = false`.
    pub async fn chat(&self, query: &ChatQuery) -> ChatReply {
        let start = Instant::now();

        tracing::info!(
            query_type = query.query_type.map(|t| t.as_str()).unwrap_or("unspecified"),
            language = %query.language,
            query_len = query.query.chars().count(),
            "Processing chatbot query"
        );

        let Some(provider) = &self.provider else {
            let query_type = query.query_type.unwrap_or(QueryType::General);
            tracing::warn!(
                query_type = query_type.as_str(),
                "No Gemini API key configured, using mock chatbot response"
            );
            metrics::record_chat(query_type.as_str(), "mock");

            let profile = profile(query_type);
            return self.reply(
                query_type,
                profile.mock_response.to_string(),
                profile.mock_confidence,
                start,
            );
        };

        let query_type = match query.query_type {
            Some(query_type) => query_type,
            None => self.classify(provider.as_ref(), &query.query).await,
        };

        match self.generate(provider.as_ref(), query, query_type).await {
            Ok(text) => {
                metrics::record_chat(query_type.as_str(), "gemini");
                tracing::info!(
                    query_type = query_type.as_str(),
                    response_length = text.len(),
                    "Chatbot response generated"
                );
                self.reply(query_type, text, LIVE_CONFIDENCE, start)
            }
            Err(e) => {
                metrics::record_chat(query_type.as_str(), "failed");
                tracing::error!(error = %e, query_type = query_type.as_str(), "Chatbot query failed");
                ChatReply::failed(&e.to_string(), start.elapsed().as_secs_f64())
            }
        }
    }

    /// Ask the model for a category. Unknown tokens and failures are `General`.
    async fn classify(&self, provider: &dyn GenerativeProvider, query: &str) -> QueryType {
        let parts = [PromptPart::Text(classification_prompt(query))];

        match generate_recorded(provider, &parts, &GenerationParams::default()).await {
            Ok(reply) => {
                let query_type = QueryType::from_label(&reply.text).unwrap_or(QueryType::General);
                tracing::debug!(
                    token = %reply.text.trim(),
                    query_type = query_type.as_str(),
                    "Classified chatbot query"
                );
                query_type
            }
            Err(e) => {
                tracing::warn!(error = %e, "Query classification failed, defaulting to general");
                QueryType::General
            }
        }
    }

    async fn generate(
        &self,
        provider: &dyn GenerativeProvider,
        query: &ChatQuery,
        query_type: QueryType,
    ) -> Result<String, ProviderError> {
        let parts = [
            PromptPart::text(KNOWLEDGE_PREAMBLE),
            PromptPart::Text(build_prompt(query, query_type)),
        ];

        let reply = generate_recorded(provider, &parts, &GenerationParams::default()).await?;
        Ok(reply.text)
    }

    fn reply(
        &self,
        query_type: QueryType,
        response: String,
        confidence: f64,
        start: Instant,
    ) -> ChatReply {
        ChatReply {
            success: true,
            response,
            query_type,
            confidence,
            sources: SOURCES.iter().map(|s| s.to_string()).collect(),
            follow_up_questions: follow_up_questions(query_type),
            emergency_contact: emergency_contact(query_type),
            processing_time: start.elapsed().as_secs_f64(),
            api_version: API_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockProvider;

    fn live(provider: &Arc<MockProvider>) -> ChatbotService {
        ChatbotService::new(Some(provider.clone() as Arc<dyn GenerativeProvider>))
    }

    fn prompt_text(part: &PromptPart) -> &str {
        match part {
            PromptPart::Text(text) => text,
            PromptPart::Image { .. } => panic!("unexpected image part"),
        }
    }

    #[test]
    fn every_category_has_a_profile() {
        for query_type in QueryType::ALL {
            assert_eq!(profile(query_type).query_type, query_type);
            assert_eq!(follow_up_questions(query_type).len(), 3);
        }
    }

    #[test]
    fn mock_confidence_ordering() {
        let c = |t| profile(t).mock_confidence;
        assert_eq!(c(QueryType::Emergency), 0.9);
        assert!(c(QueryType::Emergency) > c(QueryType::FirstAid));
        assert!(c(QueryType::FirstAid) > c(QueryType::Prevention));
        assert!(c(QueryType::Prevention) > c(QueryType::SpeciesInfo));
        assert!(c(QueryType::SpeciesInfo) > c(QueryType::General));
        assert_eq!(c(QueryType::General), 0.7);
    }

    #[test]
    fn emergency_contact_only_for_emergency() {
        for query_type in QueryType::ALL {
            let contact = emergency_contact(query_type);
            assert_eq!(
                contact.as_deref().is_some_and(|c| !c.is_empty()),
                query_type == QueryType::Emergency
            );
        }
    }

    #[test]
    fn prompts_share_template_and_differ_by_instruction() {
        let mut query = ChatQuery::new("Is the puff adder dangerous?");
        query.language = "sw".to_string();

        let prompts: Vec<String> = QueryType::ALL
            .into_iter()
            .map(|t| build_prompt(&query, t))
            .collect();

        for (prompt, query_type) in prompts.iter().zip(QueryType::ALL) {
            assert!(prompt.starts_with("User query: Is the puff adder dangerous?\nLanguage: sw"));
            assert!(prompt.contains(profile(query_type).instruction));
            assert!(prompt.ends_with(FORMATTING_DIRECTIVES));
        }
        assert!(prompts[3].contains("999 in Kenya"));
    }

    #[tokio::test]
    async fn no_credential_defaults_to_general_mock() {
        let service = ChatbotService::new(None);
        let reply = service.chat(&ChatQuery::new("What do I do if bitten?")).await;

        assert!(reply.success);
        assert_eq!(reply.query_type, QueryType::General);
        assert_eq!(reply.confidence, 0.7);
        assert_eq!(reply.response, profile(QueryType::General).mock_response);
        assert!(reply.emergency_contact.is_none());
        assert_eq!(reply.sources, SOURCES);
        assert_eq!(reply.follow_up_questions.len(), 3);
    }

    #[tokio::test]
    async fn no_credential_honours_explicit_category() {
        let service = ChatbotService::new(None);
        let reply = service
            .chat(&ChatQuery::new("Help!").with_type(QueryType::Emergency))
            .await;

        assert_eq!(reply.query_type, QueryType::Emergency);
        assert_eq!(reply.confidence, 0.9);
        assert_eq!(reply.emergency_contact.as_deref(), Some(EMERGENCY_CONTACT));
    }

    #[tokio::test]
    async fn classifies_then_generates() {
        let provider = Arc::new(
            MockProvider::new("gemini-1.5-pro")
                .with_reply("  First_Aid\n")
                .with_reply("1. Keep calm"),
        );
        let reply = live(&provider).chat(&ChatQuery::new("I was bitten, what now?")).await;

        assert!(reply.success);
        assert_eq!(reply.query_type, QueryType::FirstAid);
        assert_eq!(reply.response, "1. Keep calm");
        assert_eq!(reply.confidence, 0.85);
        assert_eq!(provider.calls(), 2);

        let prompts = provider.prompts();
        assert!(prompt_text(&prompts[0][0]).contains("Query: \"I was bitten, what now?\""));
        assert_eq!(prompt_text(&prompts[1][0]), KNOWLEDGE_PREAMBLE);
        assert!(prompt_text(&prompts[1][1]).contains(profile(QueryType::FirstAid).instruction));
    }

    #[tokio::test]
    async fn unknown_token_defaults_to_general() {
        let provider = Arc::new(
            MockProvider::new("m")
                .with_reply("veterinary")
                .with_reply("Snakes are reptiles."),
        );
        let reply = live(&provider).chat(&ChatQuery::new("Tell me about snakes")).await;

        assert!(reply.success);
        assert_eq!(reply.query_type, QueryType::General);
        assert!(reply.emergency_contact.is_none());
    }

    #[tokio::test]
    async fn classification_failure_defaults_to_general() {
        let provider = Arc::new(
            MockProvider::new("m")
                .with_error(ProviderError::RateLimited)
                .with_reply("General advice."),
        );
        let reply = live(&provider).chat(&ChatQuery::new("Tell me about snakes")).await;

        assert!(reply.success);
        assert_eq!(reply.query_type, QueryType::General);
        assert_eq!(reply.response, "General advice.");
    }

    #[tokio::test]
    async fn explicit_category_skips_classification() {
        let provider = Arc::new(MockProvider::new("m").with_reply("Call 999 now."));
        let reply = live(&provider)
            .chat(&ChatQuery::new("Bitten!").with_type(QueryType::Emergency))
            .await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(reply.query_type, QueryType::Emergency);
        assert_eq!(reply.emergency_contact.as_deref(), Some(EMERGENCY_CONTACT));
    }

    #[tokio::test]
    async fn generation_failure_returns_apology() {
        let provider = Arc::new(
            MockProvider::new("m").with_error(ProviderError::ApiError("quota exceeded".into())),
        );
        let reply = live(&provider)
            .chat(&ChatQuery::new("Bitten!").with_type(QueryType::Emergency))
            .await;

        assert!(!reply.success);
        assert_eq!(reply.query_type, QueryType::General);
        assert_eq!(reply.confidence, 0.0);
        assert!(reply.response.starts_with("I apologize"));
        assert!(reply.response.contains("quota exceeded"));
        assert!(reply.emergency_contact.is_none());
    }
}
