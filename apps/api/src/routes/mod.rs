pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::interaction_log::handlers as logs;
use crate::planning::handlers as planning;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_handler))
        // Plan generator
        .route("/api/analyze-company", post(planning::handle_analyze_company))
        .route("/api/company-signals", post(planning::handle_company_signals))
        .route("/api/plan/render", post(planning::handle_render_plan))
        // Chatbot
        .route("/api/chatbot", post(chat::handle_chatbot));

    if state.config.expose_log_routes {
        router = router
            .route("/api/logs/plan-generator", get(logs::handle_plan_logs))
            .route("/api/logs/chatbot", get(logs::handle_chatbot_logs))
            .route("/api/logs/stats", get(logs::handle_log_stats));
    }

    router.with_state(state)
}
