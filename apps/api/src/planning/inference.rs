//! Context inference: classifies the hiring team's ML maturity, infrastructure
//! complexity and likely challenges.
//!
//! One provider call when a provider is configured; otherwise, or on any
//! failure, a deterministic heuristic over the weak signals and raw job text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::llm_client::prompts::fill;
use crate::llm_client::{complete_json, ChatMessage, CompletionRequest, LlmProvider};
use crate::planning::prompts::{INFERENCE_PROMPT_TEMPLATE, INFERENCE_SYSTEM};

const DEFAULT_CHALLENGES: &str =
    "Balancing model development velocity with production reliability.";
const RESEARCH_CHALLENGES: &str =
    "Moving research models to production. Establishing MLOps practices.";
const STARTUP_CHALLENGES: &str =
    "Building ML infrastructure from scratch. Prioritizing which problems to solve first.";
const SCALE_CHALLENGES: &str =
    "Managing technical debt. Improving model performance at scale. Ensuring model reliability.";

/// Only this many characters of the job description go into the prompt.
const PROMPT_JD_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MlMaturity {
    Early,
    #[default]
    Intermediate,
    Advanced,
}

impl MlMaturity {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "early" => Some(Self::Early),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfraComplexity {
    Low,
    #[default]
    Medium,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    High,
}

impl InfraComplexity {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace(' ', "-").as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "medium-high" => Some(Self::MediumHigh),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredContext {
    pub ml_maturity: MlMaturity,
    pub infra_complexity: InfraComplexity,
    pub likely_challenges: String,
}

/// Loose shape of the model's reply; every field may be missing or mistyped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInference {
    #[serde(default)]
    ml_maturity: Option<Value>,
    #[serde(default)]
    infra_complexity: Option<Value>,
    #[serde(default)]
    likely_challenges: Option<Value>,
}

impl RawInference {
    /// Fills anything missing or unrecognised from the defaults.
    fn into_context(self) -> InferredContext {
        let label = |v: Option<Value>| v.and_then(|v| v.as_str().map(str::to_string));

        let likely_challenges = match self.likely_challenges {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Array(items)) => {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.trim().is_empty() {
                    DEFAULT_CHALLENGES.to_string()
                } else {
                    joined
                }
            }
            _ => DEFAULT_CHALLENGES.to_string(),
        };

        InferredContext {
            ml_maturity: label(self.ml_maturity)
                .and_then(|l| MlMaturity::from_label(&l))
                .unwrap_or_default(),
            infra_complexity: label(self.infra_complexity)
                .and_then(|l| InfraComplexity::from_label(&l))
                .unwrap_or_default(),
            likely_challenges,
        }
    }
}

/// Infers the team context. Never fails.
pub async fn infer_context(
    llm: Option<&dyn LlmProvider>,
    company_name: &str,
    job_description: &str,
    weak_signals: &[String],
) -> InferredContext {
    if let Some(llm) = llm {
        let jd_excerpt: String = job_description.chars().take(PROMPT_JD_CHARS).collect();
        let signals = weak_signals.join("; ");
        let prompt = fill(
            INFERENCE_PROMPT_TEMPLATE,
            &[
                ("company_name", company_name),
                ("weak_signals", &signals),
                ("job_description", &jd_excerpt),
            ],
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(INFERENCE_SYSTEM),
            ChatMessage::user(prompt),
        ])
        .light();

        match complete_json::<RawInference>(llm, request).await {
            Ok(raw) => return raw.into_context(),
            Err(e) => warn!("Context inference via {} failed, using heuristics: {e}", llm.name()),
        }
    }

    heuristic_context(job_description, weak_signals)
}

/// Deterministic fallback classification. Signal checks are case-sensitive,
/// so "Distributed systems mentioned..." alone does not raise complexity.
pub fn heuristic_context(job_description: &str, weak_signals: &[String]) -> InferredContext {
    let job_text = job_description.to_lowercase();
    let any_signal = |needles: &[&str]| {
        weak_signals
            .iter()
            .any(|s| needles.iter().any(|needle| s.contains(needle)))
    };

    let mut likely_challenges = DEFAULT_CHALLENGES;

    let ml_maturity = if any_signal(&["production", "operational"]) {
        MlMaturity::Advanced
    } else if any_signal(&["research"]) {
        likely_challenges = RESEARCH_CHALLENGES;
        MlMaturity::Early
    } else {
        MlMaturity::Intermediate
    };

    let infra_complexity = if any_signal(&["distributed", "kubernetes"]) {
        InfraComplexity::High
    } else if any_signal(&["real-time"]) {
        InfraComplexity::MediumHigh
    } else {
        InfraComplexity::Medium
    };

    if job_text.contains("startup") || job_text.contains("early stage") {
        likely_challenges = STARTUP_CHALLENGES;
    } else if job_text.contains("scale") || job_text.contains("enterprise") {
        likely_challenges = SCALE_CHALLENGES;
    }

    InferredContext {
        ml_maturity,
        infra_complexity,
        likely_challenges: likely_challenges.to_string(),
    }
}
