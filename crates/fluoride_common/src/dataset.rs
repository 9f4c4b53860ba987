//! Fluoridation dataset ingestion
//!
//! Reads the "State Highest Annual Average Fluoride" CSV, derives the full
//! state name from the postal abbreviation and replaces missing fluoride
//! readings with 0. The loaded dataset is immutable.

use crate::error::DatasetError;
use crate::states;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const STATE_COLUMN: &str = "State";
pub const YEAR_COLUMN: &str = "Year";
pub const CWS_COLUMN: &str = "CWS Adjusted Name";
pub const FLUORIDE_COLUMN: &str = "Highest Adjusted CWS Monthly Fluoride Average";

/// One CWS row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluorideRecord {
    /// Postal abbreviation as published
    pub state: String,
    /// None for abbreviations outside the 50 states + DC
    pub state_name: Option<String>,
    pub year: i32,
    pub cws_name: String,
    /// mg/L, 0 when the source cell was empty or NaN
    pub fluoride: f64,
}

/// Where to read the CSV from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            DataSource::Url(source.to_string())
        } else {
            DataSource::Path(PathBuf::from(source))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FluorideDataset {
    records: Vec<FluorideRecord>,
}

impl FluorideDataset {
    pub fn new(records: Vec<FluorideRecord>) -> Self {
        Self { records }
    }

    pub fn load(source: &DataSource, timeout: Duration) -> Result<Self, DatasetError> {
        let dataset = match source {
            DataSource::Path(path) => Self::load_path(path)?,
            DataSource::Url(url) => Self::load_url(url, timeout)?,
        };
        info!("Loaded {} fluoride records", dataset.len());
        Ok(dataset)
    }

    pub fn load_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn load_url(url: &str, timeout: Duration) -> Result<Self, DatasetError> {
        info!("Fetching dataset from {}", url);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DatasetError::Fetch(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| DatasetError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DatasetError::Fetch(format!("HTTP {} from {}", response.status(), url)));
        }

        let body = response.bytes().map_err(|e| DatasetError::Fetch(e.to_string()))?;
        Self::from_reader(body.as_ref())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DatasetError::MissingColumn(name))
        };
        let state_idx = column(STATE_COLUMN)?;
        let year_idx = column(YEAR_COLUMN)?;
        let cws_idx = column(CWS_COLUMN)?;
        let fluoride_idx = column(FLUORIDE_COLUMN)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let field = |idx: usize| row.get(idx).unwrap_or("").trim();

            let state = field(state_idx).to_string();
            let year = parse_year(field(year_idx)).ok_or_else(|| DatasetError::InvalidYear {
                value: field(year_idx).to_string(),
                line,
            })?;

            records.push(FluorideRecord {
                state_name: states::state_name(&state).map(str::to_string),
                state,
                year,
                cws_name: field(cws_idx).to_string(),
                fluoride: parse_fluoride(field(fluoride_idx)),
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[FluorideRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years in first-seen order
    pub fn years(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.year)
            .filter(|year| seen.insert(*year))
            .collect()
    }

    /// Distinct state abbreviations in first-seen order
    pub fn states(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.state.as_str())
            .filter(|state| seen.insert(*state))
            .collect()
    }

    pub fn for_state<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a FluorideRecord> + 'a {
        self.records.iter().filter(move |r| r.state == state)
    }

    pub fn for_state_year<'a>(
        &'a self,
        state: &'a str,
        year: i32,
    ) -> impl Iterator<Item = &'a FluorideRecord> + 'a {
        self.for_state(state).filter(move |r| r.year == year)
    }
}

fn parse_year(value: &str) -> Option<i32> {
    value.parse::<i32>().ok().or_else(|| {
        // Some exports write integral columns as floats ("2021.0")
        value
            .parse::<f64>()
            .ok()
            .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
            .map(|y| y as i32)
    })
}

fn parse_fluoride(value: &str) -> f64 {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
