use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::models::{ChatContext, ChatQuery, ChatReply, ContextAck};
use crate::services::catalog::{self, TopicListing};
use crate::AppState;

/// Answer a snakebite question. A failed generation is still a reply body,
/// sent with 502.
pub async fn chat(
    State(state): State<AppState>,
    Json(query): Json<ChatQuery>,
) -> Result<(StatusCode, Json<ChatReply>), AppError> {
    query.validate()?;

    tracing::info!(
        user_id = query.user_id.as_deref().unwrap_or("-"),
        session_id = query.session_id.as_deref().unwrap_or("-"),
        "Chatbot query received"
    );

    let reply = state.chatbot.chat(&query).await;
    let status = if reply.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };

    Ok((status, Json(reply)))
}

/// Acknowledge conversation context. Nothing is stored.
pub async fn update_context(Json(context): Json<ChatContext>) -> Result<Json<ContextAck>, AppError> {
    context.validate()?;

    tracing::info!(
        user_id = %context.user_id,
        session_id = %context.session_id,
        history_len = context.conversation_history.len(),
        "Chatbot context update received"
    );

    Ok(Json(ContextAck {
        success: true,
        message: "Context updated successfully".to_string(),
        user_id: context.user_id,
        session_id: context.session_id,
    }))
}

pub async fn topics() -> Json<TopicListing> {
    Json(catalog::topic_listing())
}
