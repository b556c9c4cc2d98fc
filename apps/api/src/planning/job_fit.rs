//! Job-fit analyzer: asks the provider for requirement/match/evidence
//! triples as strict JSON.
//!
//! An empty list means "fit analysis unavailable", not "no requirements".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm_client::prompts::fill;
use crate::llm_client::{complete_json, ChatMessage, CompletionRequest, LlmProvider};
use crate::planning::prompts::{FIT_PROMPT_TEMPLATE, FIT_SYSTEM_TEMPLATE};
use crate::profile::{CANDIDATE_CV, CANDIDATE_FIRST_NAME, CANDIDATE_NAME};

const FIT_MAX_TOKENS: u32 = 4000;

static GAP_EVIDENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)I have closely related experience in .+primary risk is .+mitigated by .+")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFitItem {
    pub requirement: String,
    pub matches: bool,
    #[serde(default)]
    pub evidence: String,
}

#[derive(Debug, Deserialize)]
struct JobFitResponse {
    #[serde(default)]
    requirements: Vec<JobFitItem>,
}

/// True when non-match evidence follows the three-clause gap template.
pub fn evidence_follows_gap_template(evidence: &str) -> bool {
    GAP_EVIDENCE.is_match(evidence)
}

/// Stable sort: matched requirements first, original order otherwise kept.
pub fn sort_matched_first(items: &mut [JobFitItem]) {
    items.sort_by_key(|item| !item.matches);
}

/// Runs the fit analysis. Never fails; any provider or parse error yields an
/// empty list.
pub async fn analyze_job_fit(
    llm: Option<&dyn LlmProvider>,
    company_name: &str,
    job_description: &str,
) -> Vec<JobFitItem> {
    let Some(llm) = llm else {
        return Vec::new();
    };

    let system = fill(FIT_SYSTEM_TEMPLATE, &[("cv", CANDIDATE_CV)]);
    let prompt = fill(
        FIT_PROMPT_TEMPLATE,
        &[
            ("candidate_name", CANDIDATE_NAME),
            ("first_name", CANDIDATE_FIRST_NAME),
            ("company_name", company_name),
            ("job_description", job_description),
        ],
    );
    let request = CompletionRequest::new(vec![ChatMessage::system(system), ChatMessage::user(prompt)])
        .max_tokens(FIT_MAX_TOKENS);

    let items = match complete_json::<JobFitResponse>(llm, request).await {
        Ok(response) => response.requirements,
        Err(e) => {
            warn!("Job-fit analysis via {} failed: {e}", llm.name());
            return Vec::new();
        }
    };

    for item in items.iter().filter(|i| !i.matches) {
        if !evidence_follows_gap_template(&item.evidence) {
            warn!(
                "Job-fit evidence for unmatched requirement '{}' does not follow the gap template",
                item.requirement
            );
        }
    }

    info!(
        "Job-fit analysis: {} requirements, {} matched",
        items.len(),
        items.iter().filter(|i| i.matches).count()
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::llm_client::testing::StubProvider;

    const GAP: &str = "I have closely related experience in Docker and ECS and Kubernetes demonstrates the same underlying skills of orchestration. The primary risk is no direct Kubernetes use, which is mitigated by fast learning.";

    fn item(requirement: &str, matches: bool) -> JobFitItem {
        JobFitItem {
            requirement: requirement.to_string(),
            matches,
            evidence: String::new(),
        }
    }

    #[test]
    fn test_gap_template_pattern() {
        assert!(evidence_follows_gap_template(GAP));
        assert!(!evidence_follows_gap_template("No Kubernetes experience."));
        assert!(!evidence_follows_gap_template(
            "I have closely related experience in Docker. Risky."
        ));
    }

    #[test]
    fn test_sort_matched_first_is_stable() {
        let mut items = vec![
            item("Kubernetes", false),
            item("Python", true),
            item("Go", false),
            item("PyTorch", true),
        ];
        sort_matched_first(&mut items);
        let order: Vec<&str> = items.iter().map(|i| i.requirement.as_str()).collect();
        assert_eq!(order, vec!["Python", "PyTorch", "Kubernetes", "Go"]);
    }

    #[tokio::test]
    async fn test_no_provider_yields_empty_list() {
        assert!(analyze_job_fit(None, "Acme", "jd").await.is_empty());
    }

    #[tokio::test]
    async fn test_parses_requirements_and_requests_json() {
        let reply = serde_json::json!({
            "requirements": [
                {"requirement": "Python", "matches": true, "evidence": "Used at BILL."},
                {"requirement": "Kubernetes", "matches": false, "evidence": GAP}
            ]
        })
        .to_string();
        let stub = StubProvider::replying(&reply);

        let items = analyze_job_fit(Some(&stub), "Acme", "Python and Kubernetes").await;
        assert_eq!(items.len(), 2);
        assert!(items[0].matches);
        for unmatched in items.iter().filter(|i| !i.matches) {
            assert!(evidence_follows_gap_template(&unmatched.evidence));
        }

        let request = &stub.requests()[0];
        assert!(request.json_output);
        assert!(request.messages[0].content.starts_with(CANDIDATE_CV));
        assert!(request.messages[1].content.contains("Python and Kubernetes"));
    }

    #[tokio::test]
    async fn test_missing_requirements_key_is_empty() {
        let stub = StubProvider::replying(r#"{"other": []}"#);
        assert!(analyze_job_fit(Some(&stub), "Acme", "jd").await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_empty() {
        let stub = StubProvider::replying("Here are the requirements: Python");
        assert!(analyze_job_fit(Some(&stub), "Acme", "jd").await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_is_empty() {
        let stub = StubProvider::failing(429);
        assert!(analyze_job_fit(Some(&stub), "Acme", "jd").await.is_empty());
    }
}
