//! Axum route handlers for the plan generator.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interaction_log::PlanLogEntry;
use crate::planning::analyzer::{analyze_company, company_signals, CompanySignals};
use crate::planning::job_fit::JobFitItem;
use crate::planning::plan::PlanMetadata;
use crate::planning::plan_parser::{parse_plan_text, RenderedPlan};
use crate::planning::signals::collect_weak_signals;
use crate::scrape::{looks_like_url, ScrapeError};
use crate::state::AppState;

/// Scraped text shorter than this is treated as a blocked page.
const MIN_SCRAPED_CHARS: usize = 50;
const MISSING_FIELDS: &str = "Company name and job description are required";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    #[serde(default)]
    pub company_name: String,
    /// Posting text, or a link to the posting.
    #[serde(default)]
    pub job_description: String,
}

impl CompanyRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.company_name.trim().is_empty() || self.job_description.trim().is_empty() {
            return Err(AppError::Validation(MISSING_FIELDS.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeCompanyResponse {
    pub plan: String,
    pub job_fit: Vec<JobFitItem>,
    pub metadata: PlanMetadata,
    pub weak_signals: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderPlanRequest {
    #[serde(default)]
    pub plan: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analyze-company
///
/// Resolves a posting URL into text when needed, then generates the plan and
/// the job-fit list concurrently. The interaction is logged without waiting.
pub async fn handle_analyze_company(
    State(state): State<AppState>,
    Json(request): Json<CompanyRequest>,
) -> Result<Json<AnalyzeCompanyResponse>, AppError> {
    request.validate()?;

    let is_url = looks_like_url(&request.job_description);
    info!(
        "Analyze request for {} (job description length: {}, url: {is_url})",
        request.company_name,
        request.job_description.len()
    );

    let job_description = if is_url {
        match resolve_posting(&state, &request.job_description).await {
            Ok(text) => text,
            Err(e) => {
                state.interaction_log.record_plan(PlanLogEntry {
                    company_name: request.company_name.clone(),
                    job_description: request.job_description.clone(),
                    is_url,
                    error: Some(e.to_string()),
                    ..Default::default()
                });
                return Err(e);
            }
        }
    } else {
        request.job_description.clone()
    };

    let analysis = analyze_company(
        state.llm(),
        &state.config,
        &request.company_name,
        &job_description,
    )
    .await;
    let weak_signals = collect_weak_signals(&job_description);

    state.interaction_log.record_plan(PlanLogEntry {
        company_name: request.company_name.clone(),
        job_description,
        is_url,
        plan: analysis.plan.plan.clone(),
        job_fit: serde_json::to_string(&analysis.job_fit).unwrap_or_default(),
        metadata: serde_json::to_value(&analysis.plan.metadata).ok(),
        error: None,
    });

    Ok(Json(AnalyzeCompanyResponse {
        plan: analysis.plan.plan,
        job_fit: analysis.job_fit,
        metadata: analysis.plan.metadata,
        weak_signals,
    }))
}

/// POST /api/company-signals
///
/// Weak signals and the inferred team context for a pasted job description.
pub async fn handle_company_signals(
    State(state): State<AppState>,
    Json(request): Json<CompanyRequest>,
) -> Result<Json<CompanySignals>, AppError> {
    request.validate()?;

    let signals = company_signals(state.llm(), &request.company_name, &request.job_description).await;

    Ok(Json(signals))
}

/// POST /api/plan/render
///
/// Parses plan text into research bullets and day-banded items.
pub async fn handle_render_plan(Json(request): Json<RenderPlanRequest>) -> Json<RenderedPlan> {
    Json(parse_plan_text(&request.plan))
}

async fn resolve_posting(state: &AppState, url: &str) -> Result<String, AppError> {
    let text = state.scraper.scrape(url.trim()).await.map_err(|e| {
        warn!("Scraping {url} failed: {e}");
        AppError::UpstreamBlocked(e.to_string())
    })?;

    if text.chars().count() < MIN_SCRAPED_CHARS {
        warn!("Scraped text from {url} too short: {} chars", text.chars().count());
        return Err(AppError::UpstreamBlocked(ScrapeError::Blocked.to_string()));
    }

    info!("Scraped job description, length: {}", text.len());
    Ok(text)
}
