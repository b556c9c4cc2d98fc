//! Axum route handler for the chatbot.

use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::chat::responder::{respond, ConversationTurn};
use crate::errors::AppError;
use crate::interaction_log::ChatLogEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
}

/// POST /api/chatbot
///
/// Always answers 200 once the message is present; provider failures become
/// the apology reply. The interaction is logged without waiting.
pub async fn handle_chatbot(
    State(state): State<AppState>,
    Json(request): Json<ChatbotRequest>,
) -> Result<Json<ChatbotResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let started = Instant::now();
    let reply = respond(
        state.llm(),
        &state.supplemental,
        &request.message,
        &request.conversation_history,
    )
    .await;
    let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!("Chat reply via {} in {latency}ms", reply.model);

    state.interaction_log.record_chat(ChatLogEntry {
        message: request.message,
        history_len: request.conversation_history.len(),
        response: reply.text.clone(),
        metadata: Some(json!({ "model": reply.model, "latency": latency })),
        error: reply.error,
    });

    Ok(Json(ChatbotResponse {
        response: reply.text,
    }))
}
