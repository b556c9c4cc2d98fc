use std::sync::Arc;

use crate::config::Config;
use crate::interaction_log::InteractionLogger;
use crate::llm_client::LlmProvider;
use crate::profile::SupplementalText;
use crate::scrape::JobScraper;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Selected once at startup. `None` puts every component on its fallback path.
    pub llm: Option<Arc<dyn LlmProvider>>,
    pub scraper: Arc<dyn JobScraper>,
    pub interaction_log: InteractionLogger,
    /// Process-scoped; loaded on the first chat request.
    pub supplemental: Arc<SupplementalText>,
}

impl AppState {
    pub fn llm(&self) -> Option<&dyn LlmProvider> {
        self.llm.as_deref()
    }
}

#[cfg(test)]
impl AppState {
    /// No provider, no log sink, empty supplemental text.
    pub fn for_tests() -> Self {
        AppState {
            config: Arc::new(Config::for_tests()),
            llm: None,
            scraper: Arc::new(crate::scrape::HttpJobScraper::new(reqwest::Client::new(), None)),
            interaction_log: InteractionLogger::disabled(),
            supplemental: Arc::new(SupplementalText::preloaded("")),
        }
    }
}
