//! Dashboard selection logic
//!
//! Filters the dataset for a (year, state) selection and produces the map
//! points, table rows and feedback text the front-end renders.

use crate::dataset::{FluorideDataset, FluorideRecord};
use crate::error::SelectionError;
use crate::feedback::FeedbackClient;
use crate::prompt::FeedbackRequest;
use crate::states;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shown until both dropdowns have a value
pub const SELECT_PROMPT_MESSAGE: &str = "Select a year and state to view data.";

/// Anything that turns a request into user-visible feedback text
pub trait FeedbackGenerator: Send + Sync {
    fn generate_feedback(&self, request: &FeedbackRequest) -> String;
}

impl FeedbackGenerator for FeedbackClient {
    fn generate_feedback(&self, request: &FeedbackRequest) -> String {
        FeedbackClient::generate_feedback(self, request)
    }
}

/// One choropleth value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub state: String,
    pub state_name: Option<String>,
    pub fluoride: f64,
}

/// One data-table row, keyed by the published column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    #[serde(rename = "State Name")]
    pub state_name: Option<String>,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "CWS Adjusted Name")]
    pub cws_name: String,
    #[serde(rename = "Highest Adjusted CWS Monthly Fluoride Average")]
    pub fluoride: f64,
}

impl From<&FluorideRecord> for TableRow {
    fn from(record: &FluorideRecord) -> Self {
        Self {
            state_name: record.state_name.clone(),
            year: record.year,
            cws_name: record.cws_name.clone(),
            fluoride: record.fluoride,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionView {
    pub map: Vec<MapPoint>,
    pub table: Vec<TableRow>,
    pub feedback: String,
}

impl SelectionView {
    fn empty() -> Self {
        Self {
            map: Vec::new(),
            table: Vec::new(),
            feedback: SELECT_PROMPT_MESSAGE.to_string(),
        }
    }
}

/// Summary facts for a state/year from the dataset alone
pub fn feedback_request(
    dataset: &FluorideDataset,
    year: i32,
    state: &str,
) -> Result<Option<FeedbackRequest>, SelectionError> {
    let state_name = states::state_name(state)
        .ok_or_else(|| SelectionError::UnknownState(state.to_string()))?;

    let year_rows: Vec<&FluorideRecord> = dataset.for_state_year(state, year).collect();
    let Some(first) = year_rows.first() else {
        return Ok(None);
    };

    let max_fluoride = year_rows
        .iter()
        .map(|r| r.fluoride)
        .fold(f64::NEG_INFINITY, f64::max);

    // Historical average spans every year on record for the state
    let (sum, count) = dataset
        .for_state(state)
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.fluoride, count + 1));
    let avg_fluoride = sum / count as f64;

    Ok(Some(FeedbackRequest {
        state_name: state_name.to_string(),
        year,
        cws_name: first.cws_name.clone(),
        max_fluoride,
        avg_fluoride,
    }))
}

pub struct Dashboard {
    dataset: Arc<FluorideDataset>,
    generator: Arc<dyn FeedbackGenerator>,
}

impl Dashboard {
    pub fn new(dataset: Arc<FluorideDataset>, generator: Arc<dyn FeedbackGenerator>) -> Self {
        Self { dataset, generator }
    }

    pub fn dataset(&self) -> &FluorideDataset {
        &self.dataset
    }

    /// Summary facts for a state/year, None when the year has no rows
    pub fn feedback_request(
        &self,
        year: i32,
        state: &str,
    ) -> Result<Option<FeedbackRequest>, SelectionError> {
        feedback_request(&self.dataset, year, state)
    }

    /// Map, table and feedback for a dropdown selection
    pub fn select(
        &self,
        year: Option<i32>,
        state: Option<&str>,
    ) -> Result<SelectionView, SelectionError> {
        let (Some(year), Some(state)) = (year, state.filter(|s| !s.is_empty())) else {
            return Ok(SelectionView::empty());
        };
        let state_name = states::state_name(state)
            .ok_or_else(|| SelectionError::UnknownState(state.to_string()))?;

        let table = self.dataset.for_state(state).map(TableRow::from).collect();
        let map = self
            .dataset
            .for_state_year(state, year)
            .map(|r| MapPoint {
                state: r.state.clone(),
                state_name: r.state_name.clone(),
                fluoride: r.fluoride,
            })
            .collect();

        let feedback = match self.feedback_request(year, state)? {
            Some(request) => {
                info!("Generating feedback for {} {}", state_name, year);
                self.generator.generate_feedback(&request)
            }
            None => format!("No data for {} in {}.", state_name, year),
        };

        Ok(SelectionView { map, table, feedback })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const SAMPLE: &str = "\
State,Year,CWS Adjusted Name,Highest Adjusted CWS Monthly Fluoride Average
OH,2021,Columbus Water,0.71
OH,2021,Dayton Water,0.69
OH,2020,Columbus Water,0.64
TX,2021,Austin Water,NaN
";

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<FeedbackRequest>>,
    }

    impl FeedbackGenerator for Recorder {
        fn generate_feedback(&self, request: &FeedbackRequest) -> String {
            self.requests.lock().unwrap().push(request.clone());
            format!("summary for {}", request.cws_name)
        }
    }

    fn dashboard() -> (Dashboard, Arc<Recorder>) {
        let dataset = Arc::new(FluorideDataset::from_reader(SAMPLE.as_bytes()).unwrap());
        let recorder = Arc::new(Recorder::default());
        (Dashboard::new(dataset, recorder.clone()), recorder)
    }

    #[test]
    fn test_incomplete_selection() {
        let (dashboard, recorder) = dashboard();
        for (year, state) in [(None, Some("OH")), (Some(2021), None), (None, None), (Some(2021), Some(""))] {
            let view = dashboard.select(year, state).unwrap();
            assert!(view.map.is_empty());
            assert!(view.table.is_empty());
            assert_eq!(view.feedback, SELECT_PROMPT_MESSAGE);
        }
        assert!(recorder.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_selection_with_data() {
        let (dashboard, recorder) = dashboard();
        let view = dashboard.select(Some(2021), Some("OH")).unwrap();

        assert_eq!(view.table.len(), 3);
        assert_eq!(view.map.len(), 2);
        assert_eq!(view.feedback, "summary for Columbus Water");

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.state_name, "Ohio");
        assert_eq!(request.year, 2021);
        assert_eq!(request.max_fluoride, 0.71);
        assert!((request.avg_fluoride - (0.71 + 0.69 + 0.64) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_year_without_rows() {
        let (dashboard, recorder) = dashboard();
        let view = dashboard.select(Some(2019), Some("OH")).unwrap();

        assert_eq!(view.feedback, "No data for Ohio in 2019.");
        assert!(view.map.is_empty());
        assert_eq!(view.table.len(), 3);
        assert!(recorder.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nan_normalized_before_feedback() {
        let (dashboard, _) = dashboard();
        let request = dashboard.feedback_request(2021, "TX").unwrap().unwrap();
        assert_eq!(request.max_fluoride, 0.0);
        assert_eq!(request.avg_fluoride, 0.0);
        assert_eq!(request.state_name, "Texas");
    }

    #[test]
    fn test_unknown_state() {
        let (dashboard, _) = dashboard();
        assert_eq!(
            dashboard.select(Some(2021), Some("ZZ")),
            Err(SelectionError::UnknownState("ZZ".to_string()))
        );
    }

    #[test]
    fn test_table_row_serializes_with_column_names() {
        let (dashboard, _) = dashboard();
        let view = dashboard.select(Some(2020), Some("OH")).unwrap();
        let json = serde_json::to_value(&view.table[0]).unwrap();
        assert_eq!(json["State Name"], "Ohio");
        assert_eq!(json["Year"], 2021);
        assert_eq!(json["CWS Adjusted Name"], "Columbus Water");
        assert_eq!(json["Highest Adjusted CWS Monthly Fluoride Average"], 0.71);
    }
}
