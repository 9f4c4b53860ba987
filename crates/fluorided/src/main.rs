//! Fluoride Daemon - Dashboard data and AI feedback API
//!
//! Loads the fluoridation dataset once, then serves selections and
//! AI-generated summaries to the dashboard front-end.

use anyhow::{Context, Result};
use fluoride_common::config::DOTENV_PATH;
use fluoride_common::{Config, Dashboard, DataSource, FeedbackClient, FluorideDataset};
use fluorided::server::{self, AppState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const DATASET_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Slack on top of the worst-case feedback time before a request is abandoned
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Fluoride Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = Config::load_env_file(Path::new(DOTENV_PATH)) {
        warn!("{}", e);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("[FATAL] {}", e);
            std::process::exit(1);
        }
    };

    // Blocking setup happens before the async runtime exists
    let source = DataSource::parse(&config.data.source);
    let dataset = FluorideDataset::load(&source, DATASET_FETCH_TIMEOUT)
        .with_context(|| format!("Failed to load dataset from {}", config.data.source))?;

    let client = FeedbackClient::from_config(&config.llm)?;
    info!(
        "Feedback via {} ({} attempts, {}s timeout)",
        config.llm.endpoint, config.llm.max_retries, config.llm.timeout_secs
    );

    let dashboard = Dashboard::new(Arc::new(dataset), Arc::new(client));
    let request_timeout = config
        .llm
        .worst_case_duration()?
        .checked_add(REQUEST_TIMEOUT_MARGIN)
        .context("Request timeout out of range")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::run(
        AppState::new(dashboard),
        &config.server.bind,
        request_timeout,
    ))
}
