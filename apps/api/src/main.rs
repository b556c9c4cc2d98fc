mod chat;
mod config;
mod errors;
mod interaction_log;
mod llm_client;
mod planning;
mod profile;
mod routes;
mod scrape;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interaction_log::InteractionLogger;
use crate::llm_client::{build_http_client, select_provider};
use crate::profile::SupplementalText;
use crate::routes::build_router;
use crate::scrape::HttpJobScraper;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client for providers, scraping and the log sink
    let http = build_http_client(Duration::from_secs(config.llm_timeout_secs))?;

    let llm = select_provider(&config, http.clone());
    if llm.is_none() {
        warn!("No LLM provider key found, every component will use its fallback path");
    }

    let interaction_log = InteractionLogger::from_config(&config, http.clone());
    if config.init_log_sheet_headers {
        interaction_log.init_headers().await;
    }

    let scraper = Arc::new(HttpJobScraper::new(http, llm.clone()));
    let supplemental = Arc::new(SupplementalText::new(
        config.supplemental_pdf_path.clone(),
        config.supplemental_text_path.clone(),
    ));

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        llm,
        scraper,
        interaction_log,
        supplemental,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
