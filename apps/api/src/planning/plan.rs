//! Plan generator: one provider call for the free-text 90-day plan, with a
//! canned template when no provider is configured or the call fails.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::llm_client::prompts::fill;
use crate::llm_client::{ChatMessage, CompletionRequest, LlmProvider, TokenUsage};
use crate::planning::prompts::{
    PLAN_PROMPT_TEMPLATE, PLAN_SYSTEM_TEMPLATE, PREVIOUS_EMPLOYER_CONTEXT, PREVIOUS_EMPLOYER_NOTE,
};
use crate::profile::{CANDIDATE_CV, CANDIDATE_FIRST_NAME, CANDIDATE_NAME};

pub const FALLBACK_MODEL: &str = "fallback";
const DIRECT_ARCHITECTURE: &str = "Direct LLM";
const TEMPLATE_ARCHITECTURE: &str = "Template";
const PLAN_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    /// Wall-clock milliseconds spent producing the plan.
    pub latency: u64,
    pub model: String,
    pub architecture: String,
    /// Estimated USD cost of the provider call.
    pub cost: f64,
    pub tokens: TokenUsage,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub plan: String,
    pub metadata: PlanMetadata,
}

/// Generates the plan text. Never fails: every provider error ends in the
/// fallback template.
pub async fn generate_plan(
    llm: Option<&dyn LlmProvider>,
    config: &Config,
    company_name: &str,
    job_description: &str,
) -> PlanResult {
    let started = Instant::now();
    let previous_employer = config.is_previous_employer(company_name);

    let Some(llm) = llm else {
        info!("No LLM provider configured, using plan template for {company_name}");
        return fallback_plan(started);
    };

    info!(
        "Generating plan via {} for {company_name} (job description length: {}, previous employer: {previous_employer})",
        llm.name(),
        job_description.len()
    );

    let request = CompletionRequest::new(vec![
        ChatMessage::system(build_system_prompt(company_name, previous_employer)),
        ChatMessage::user(build_plan_prompt(company_name, job_description, previous_employer)),
    ])
    .max_tokens(PLAN_MAX_TOKENS);

    match llm.complete(request).await {
        Ok(completion) => {
            let cost = llm.pricing().cost_usd(&completion.usage);
            info!(
                "Plan generated: model={}, tokens={}, cost=${cost:.4}",
                completion.model, completion.usage.total
            );
            PlanResult {
                plan: completion.text,
                metadata: PlanMetadata {
                    latency: elapsed_ms(started),
                    model: completion.model,
                    architecture: DIRECT_ARCHITECTURE.to_string(),
                    cost,
                    tokens: completion.usage,
                },
            }
        }
        Err(e) => {
            warn!("Plan generation via {} failed, falling back to template: {e}", llm.name());
            fallback_plan(started)
        }
    }
}

fn build_system_prompt(company_name: &str, previous_employer: bool) -> String {
    let previous_employer_context = if previous_employer {
        fill(
            PREVIOUS_EMPLOYER_CONTEXT,
            &[("first_name", CANDIDATE_FIRST_NAME), ("company_name", company_name)],
        )
    } else {
        String::new()
    };

    fill(
        PLAN_SYSTEM_TEMPLATE,
        &[
            ("candidate_name", CANDIDATE_NAME),
            ("first_name", CANDIDATE_FIRST_NAME),
            ("previous_employer_context", &previous_employer_context),
            ("cv", CANDIDATE_CV),
        ],
    )
}

fn build_plan_prompt(company_name: &str, job_description: &str, previous_employer: bool) -> String {
    let previous_employer_note = if previous_employer {
        fill(
            PREVIOUS_EMPLOYER_NOTE,
            &[("first_name", CANDIDATE_FIRST_NAME), ("company_name", company_name)],
        )
    } else {
        String::new()
    };

    fill(
        PLAN_PROMPT_TEMPLATE,
        &[
            ("candidate_name", CANDIDATE_NAME),
            ("first_name", CANDIDATE_FIRST_NAME),
            ("previous_employer_note", &previous_employer_note),
            ("company_name", company_name),
            ("job_description", job_description),
        ],
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn fallback_plan(started: Instant) -> PlanResult {
    PlanResult {
        plan: FALLBACK_PLAN.to_string(),
        metadata: PlanMetadata {
            latency: elapsed_ms(started),
            model: FALLBACK_MODEL.to_string(),
            architecture: TEMPLATE_ARCHITECTURE.to_string(),
            cost: 0.0,
            tokens: TokenUsage::default(),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback template
// ────────────────────────────────────────────────────────────────────────────

/// Written in the same grammar the plan text parser reads.
pub const FALLBACK_PLAN: &str = r#"## Research & Context

- Role Focus: The team is hiring for production ML engineering, so the first quarter centres on understanding existing systems before changing them.
- Likely Challenges: Balancing model development velocity with production reliability.
- Candidate Fit: Production ML systems, MLOps and research-grade evaluation from work at BILL and SEELab.

## First 90 Days Plan

### Days 1-30: Understanding and Mapping

**Title:** Map the ML infrastructure
**Objective:** Understand data pipelines, model serving architecture, and monitoring systems.
**Experience:** Building on my experience deploying production ML systems at BILL on AWS ECS.
**Action:** Identify the deployment patterns and MLOps workflows in place.

**Title:** Identify the highest-leverage problems
**Objective:** Speak with stakeholders, review existing models, and prioritize based on business impact.
**Experience:** At BILL I analyzed production error logs to identify clustering opportunities.
**Action:** Look for systematic patterns in current ML workflows.

**Title:** Establish baseline metrics
**Objective:** Understand current model performance, evaluation frameworks, and success criteria.
**Experience:** Model evaluation and benchmarking from research work at SEELab.
**Action:** Assess how evaluation practices align with production needs.

### Days 31-60: Delivering Value and Building Relationships

**Title:** Ship a first improvement
**Objective:** Fix a high-impact model issue or improve an evaluation metric.
**Experience:** Production ML systems and MLOps work at BILL.
**Action:** Prioritize improvements that have clear operational impact.

**Title:** Build relationships
**Objective:** Work with data engineers, product managers, and other ML engineers to understand pain points.
**Experience:** Consulting work at PromoDrone and the Data Science Student Society.
**Action:** Synthesize technical requirements with business needs.

**Title:** Propose a strategic initiative
**Objective:** Suggest a concrete improvement such as a better experimentation framework or model monitoring.
**Experience:** Creating reusable generation and evaluation frameworks at BILL.
**Action:** Design solutions that can scale across the organization.

### Days 61-90: Strategic Execution and Establishing Patterns

**Title:** Execute on the strategic initiative
**Objective:** Begin implementing the proposed improvement.
**Experience:** PyTorch, TensorFlow, and production deployment tools (AWS, Docker, Kubernetes).
**Action:** Build robust, maintainable solutions.

**Title:** Establish patterns
**Objective:** Document learnings and create templates for future ML work.
**Experience:** The code generation framework I built at BILL.
**Action:** Create reusable patterns that accelerate future ML development.

**Title:** Plan the next quarter
**Objective:** Define clear goals based on the understanding gained in the first 90 days.
**Experience:** Strategic planning from consulting roles.
**Action:** Align technical initiatives with business objectives.
"#;
