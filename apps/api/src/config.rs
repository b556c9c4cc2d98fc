use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::ModelPricing;

/// Application configuration loaded from environment variables.
/// Provider credentials are optional: without them every LLM-backed
/// component runs its fallback path.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_model: String,
    pub openai_fast_model: String,
    pub anthropic_model: String,
    pub openai_pricing: ModelPricing,
    pub anthropic_pricing: ModelPricing,
    pub llm_timeout_secs: u64,
    /// Aliases of companies the candidate has worked at. Matched as
    /// case-insensitive substrings of the submitted company name.
    pub previous_employers: Vec<String>,
    pub supplemental_pdf_path: PathBuf,
    pub supplemental_text_path: PathBuf,
    pub google_service_account_credentials: Option<String>,
    pub google_sheet_id: Option<String>,
    pub init_log_sheet_headers: bool,
    pub expose_log_routes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 3000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
            openai_fast_model: env_or("OPENAI_FAST_MODEL", "gpt-4o-mini"),
            anthropic_model: env_or("ANTHROPIC_MODEL", "claude-sonnet-4-5"),
            openai_pricing: ModelPricing {
                input_per_million: parse_env("OPENAI_INPUT_PRICE_PER_MTOK", 2.50)?,
                output_per_million: parse_env("OPENAI_OUTPUT_PRICE_PER_MTOK", 10.00)?,
            },
            anthropic_pricing: ModelPricing {
                input_per_million: parse_env("ANTHROPIC_INPUT_PRICE_PER_MTOK", 3.00)?,
                output_per_million: parse_env("ANTHROPIC_OUTPUT_PRICE_PER_MTOK", 15.00)?,
            },
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            previous_employers: parse_list(&env_or("PREVIOUS_EMPLOYERS", "BILL")),
            supplemental_pdf_path: env_or(
                "SUPPLEMENTAL_PDF_PATH",
                "supplementals/Supplemental Interview.pdf",
            )
            .into(),
            supplemental_text_path: env_or(
                "SUPPLEMENTAL_TEXT_PATH",
                "supplementals/Supplemental Interview.txt",
            )
            .into(),
            google_service_account_credentials: optional_env("GOOGLE_SERVICE_ACCOUNT_CREDENTIALS"),
            google_sheet_id: optional_env("GOOGLE_SHEET_ID"),
            init_log_sheet_headers: parse_env("LOG_SHEETS_INIT_HEADERS", false)?,
            expose_log_routes: parse_env("EXPOSE_LOG_ROUTES", false)?,
        })
    }

    /// True when the submitted company name contains one of the configured
    /// previous-employer aliases.
    pub fn is_previous_employer(&self, company_name: &str) -> bool {
        let company = company_name.to_lowercase();
        self.previous_employers
            .iter()
            .any(|alias| company.contains(&alias.to_lowercase()))
    }
}

/// Returns the variable's value, treating unset and blank values alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Configuration with no credentials and no log sink.
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_model: "gpt-4o".to_string(),
            openai_fast_model: "gpt-4o-mini".to_string(),
            anthropic_model: "claude-sonnet-4-5".to_string(),
            openai_pricing: ModelPricing {
                input_per_million: 2.50,
                output_per_million: 10.00,
            },
            anthropic_pricing: ModelPricing {
                input_per_million: 3.00,
                output_per_million: 15.00,
            },
            llm_timeout_secs: 5,
            previous_employers: vec!["BILL".to_string()],
            supplemental_pdf_path: "does-not-exist.pdf".into(),
            supplemental_text_path: "does-not-exist.txt".into(),
            google_service_account_credentials: None,
            google_sheet_id: None,
            init_log_sheet_headers: false,
            expose_log_routes: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_list(" BILL, Bill.com ,,"),
            vec!["BILL".to_string(), "Bill.com".to_string()]
        );
    }

    #[test]
    fn test_previous_employer_match_is_case_insensitive_substring() {
        let config = Config::for_tests();
        assert!(config.is_previous_employer("bill.com"));
        assert!(config.is_previous_employer("BILL Holdings"));
        assert!(!config.is_previous_employer("Stripe"));
    }

    #[test]
    fn test_no_aliases_never_matches() {
        let mut config = Config::for_tests();
        config.previous_employers.clear();
        assert!(!config.is_previous_employer("BILL"));
    }
}
