//! Command implementations for fluoridectl

use anyhow::{Context, Result};
use fluoride_common::{
    build_prompt, feedback_request, states, Config, Dashboard, DataSource, FeedbackClient,
    FluorideDataset, GuidelineDirectory,
};
use owo_colors::OwoColorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DATASET_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

fn load_config(data: Option<&str>, require_key: bool) -> Result<Config> {
    let mut config = if require_key {
        Config::load()?
    } else {
        Config::load_without_key()?
    };
    if let Some(source) = data {
        debug!("Dataset source overridden on the command line");
        config.data.source = source.to_string();
    }
    Ok(config)
}

fn load_dataset(config: &Config) -> Result<FluorideDataset> {
    info!("Loading dataset from {}", config.data.source);
    let source = DataSource::parse(&config.data.source);
    FluorideDataset::load(&source, DATASET_FETCH_TIMEOUT)
        .with_context(|| format!("Failed to load dataset from {}", config.data.source))
}

pub fn years(data: Option<&str>) -> Result<()> {
    let dataset = load_dataset(&load_config(data, false)?)?;
    println!("{}", "[YEARS]".cyan());
    for year in dataset.years() {
        println!("  {}", year);
    }
    Ok(())
}

pub fn states(data: Option<&str>) -> Result<()> {
    let dataset = load_dataset(&load_config(data, false)?)?;
    println!("{}", "[STATES]".cyan());
    for abbr in dataset.states() {
        match states::state_name(abbr) {
            Some(name) => println!("  {:<4} {}", abbr, name),
            None => println!("  {:<4} {}", abbr, "unknown".dimmed()),
        }
    }
    Ok(())
}

pub fn table(data: Option<&str>, state: &str) -> Result<()> {
    let dataset = load_dataset(&load_config(data, false)?)?;
    let name = states::state_name(state)
        .with_context(|| format!("Unknown state abbreviation '{}'", state))?;

    println!("{}", format!("[{}]", name.to_uppercase()).cyan());
    let mut rows = 0;
    for record in dataset.for_state(state) {
        println!("  {}  {:>6.2}  {}", record.year, record.fluoride, record.cws_name);
        rows += 1;
    }
    if rows == 0 {
        println!("  {}", "no rows".dimmed());
    }
    Ok(())
}

pub fn prompt(data: Option<&str>, state: &str, year: i32) -> Result<()> {
    let dataset = load_dataset(&load_config(data, false)?)?;
    match feedback_request(&dataset, year, state)? {
        Some(request) => println!("{}", build_prompt(GuidelineDirectory::builtin(), &request)),
        None => println!("No data for {} in {}.", states::state_name(state).unwrap_or(state), year),
    }
    Ok(())
}

pub fn feedback(data: Option<&str>, state: &str, year: i32, json: bool) -> Result<()> {
    let config = load_config(data, true)?;
    let dataset = load_dataset(&config)?;
    let client = FeedbackClient::from_config(&config.llm)?;

    debug!(
        "Feedback via {} ({} attempts)",
        config.llm.endpoint, config.llm.max_retries
    );
    let dashboard = Dashboard::new(Arc::new(dataset), Arc::new(client));
    let view = dashboard.select(Some(year), Some(state))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", "[MAP]".cyan());
    for point in &view.map {
        println!("  {}  {:.2}", point.state, point.fluoride);
    }
    println!();
    println!("{}", "[TABLE]".cyan());
    for row in &view.table {
        println!("  {}  {:>6.2}  {}", row.year, row.fluoride, row.cws_name);
    }
    println!();
    println!("{}", "[AI FEEDBACK]".cyan());
    println!("{}", view.feedback);
    Ok(())
}
