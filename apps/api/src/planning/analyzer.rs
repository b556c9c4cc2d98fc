//! Company analysis orchestration: plan generation and job-fit analysis run
//! concurrently; weak signals and context inference back the signals report.

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::llm_client::LlmProvider;
use crate::planning::inference::{infer_context, InferredContext};
use crate::planning::job_fit::{analyze_job_fit, sort_matched_first, JobFitItem};
use crate::planning::plan::{generate_plan, PlanResult};
use crate::planning::signals::collect_weak_signals;

#[derive(Debug, Clone)]
pub struct CompanyAnalysis {
    pub plan: PlanResult,
    /// Matched requirements first. Empty means fit analysis was unavailable.
    pub job_fit: Vec<JobFitItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySignals {
    pub weak_signals: Vec<String>,
    pub inferences: InferredContext,
}

/// Issues both provider calls together and waits for both. Never fails.
pub async fn analyze_company(
    llm: Option<&dyn LlmProvider>,
    config: &Config,
    company_name: &str,
    job_description: &str,
) -> CompanyAnalysis {
    let (plan, mut job_fit) = tokio::join!(
        generate_plan(llm, config, company_name, job_description),
        analyze_job_fit(llm, company_name, job_description),
    );
    sort_matched_first(&mut job_fit);

    info!(
        "Analysis complete for {company_name}: model={}, latency={}ms, {} fit requirements",
        plan.metadata.model,
        plan.metadata.latency,
        job_fit.len()
    );

    CompanyAnalysis { plan, job_fit }
}

pub async fn company_signals(
    llm: Option<&dyn LlmProvider>,
    company_name: &str,
    job_description: &str,
) -> CompanySignals {
    let weak_signals = collect_weak_signals(job_description);
    let inferences = infer_context(llm, company_name, job_description, &weak_signals).await;
    CompanySignals {
        weak_signals,
        inferences,
    }
}
