//! Job-description scraping: fetch a posting URL, reduce the HTML to text and,
//! when a provider is configured, ask it to cut the posting out of the page.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::fill;
use crate::llm_client::{ChatMessage, CompletionRequest, LlmProvider};
use crate::planning::prompts::{SCRAPE_EXTRACTION_PROMPT_TEMPLATE, SCRAPE_EXTRACTION_SYSTEM};

const EXTRACTION_INPUT_CHARS: usize = 15_000;
const PLAIN_TEXT_CHARS: usize = 5_000;
const EXTRACTION_MAX_TOKENS: u32 = 2000;
const EXTRACTION_TEMPERATURE: f32 = 0.3;
const NOTHING_FOUND_MARKER: &str = "no job description found";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Automated access is blocked on this site. Please copy and paste the job description text directly.")]
    Blocked,

    #[error("Failed to fetch URL: {0}")]
    Status(StatusCode),

    #[error("Failed to fetch URL: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait JobScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<String, ScrapeError>;
}

/// True when the submitted job description is a link rather than text.
pub fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("http://") || text.starts_with("https://")
}

/// Drops script/style blocks and tags, then collapses whitespace.
pub fn strip_html(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct HttpJobScraper {
    client: Client,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl HttpJobScraper {
    pub fn new(client: Client, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { client, llm }
    }

    async fn extract_with_llm(&self, llm: &dyn LlmProvider, page_text: &str) -> Option<String> {
        let prompt = fill(
            SCRAPE_EXTRACTION_PROMPT_TEMPLATE,
            &[("page_text", truncate_chars(page_text, EXTRACTION_INPUT_CHARS))],
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(SCRAPE_EXTRACTION_SYSTEM),
            ChatMessage::user(prompt),
        ])
        .temperature(EXTRACTION_TEMPERATURE)
        .max_tokens(EXTRACTION_MAX_TOKENS);

        match llm.complete(request).await {
            Ok(completion) => {
                let extracted = completion.text.trim();
                if extracted.is_empty() || extracted.to_lowercase().contains(NOTHING_FOUND_MARKER) {
                    warn!("Provider found no job description on the page");
                    return None;
                }
                info!("Extracted job description, length: {}", extracted.len());
                Some(extracted.to_string())
            }
            Err(e) => {
                warn!("Job description extraction via {} failed: {e}", llm.name());
                None
            }
        }
    }
}

#[async_trait]
impl JobScraper for HttpJobScraper {
    async fn scrape(&self, url: &str) -> Result<String, ScrapeError> {
        info!("Fetching job posting: {url}");

        let response = self
            .client
            .get(url.trim())
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, BROWSER_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::CACHE_CONTROL, "max-age=0")
            .header(header::UPGRADE_INSECURE_REQUESTS, "1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ScrapeError::Blocked
                }
                other => ScrapeError::Status(other),
            });
        }

        let html = response.text().await?;
        let page_text = strip_html(&html);
        info!("Fetched page, html length: {}, text length: {}", html.len(), page_text.len());

        if let Some(llm) = &self.llm {
            if let Some(extracted) = self.extract_with_llm(llm.as_ref(), &page_text).await {
                return Ok(extracted);
            }
        }

        Ok(truncate_chars(&page_text, PLAIN_TEXT_CHARS).to_string())
    }
}
