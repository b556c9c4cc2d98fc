//! Read-only log routes. Mounted only when `EXPOSE_LOG_ROUTES` is set.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::interaction_log::{ChatLogRecord, LogStats, PlanLogRecord};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse<T> {
    pub logs: Vec<T>,
}

/// GET /api/logs/plan-generator?limit=N
pub async fn handle_plan_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Json<LogsResponse<PlanLogRecord>> {
    Json(LogsResponse {
        logs: state.interaction_log.plan_logs(query.limit).await,
    })
}

/// GET /api/logs/chatbot?limit=N
pub async fn handle_chatbot_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Json<LogsResponse<ChatLogRecord>> {
    Json(LogsResponse {
        logs: state.interaction_log.chatbot_logs(query.limit).await,
    })
}

/// GET /api/logs/stats
pub async fn handle_log_stats(State(state): State<AppState>) -> Json<LogStats> {
    Json(state.interaction_log.stats().await)
}
