//! Feedback prompt builder
//!
//! Turns a selection summary into the single-paragraph prompt sent to the
//! chat-completion endpoint.

use crate::guidelines::GuidelineDirectory;
use serde::{Deserialize, Serialize};

/// System message establishing the assistant persona
pub const SYSTEM_PROMPT: &str = "You are an assistant for public health data summaries.";

/// Appended when the state has no guideline page
pub const FALLBACK_GUIDANCE: &str = "For general information on fluoride levels, refer to the CDC’s WFRS (Water Fluoridation Reporting System) or the 'My Water Fluoride' tool available through the CDC website.";

/// Facts about one dashboard selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub state_name: String,
    pub year: i32,
    pub cws_name: String,
    /// Highest monthly adjusted average for the selected year (mg/L)
    pub max_fluoride: f64,
    /// Mean over every year on record for the state
    pub avg_fluoride: f64,
}

/// Build the user prompt for a request
pub fn build_prompt(directory: &GuidelineDirectory, request: &FeedbackRequest) -> String {
    let additional_info = match directory.lookup(&request.state_name) {
        Some(url) => format!("For specific state guidelines, refer to: {}.", url),
        None => FALLBACK_GUIDANCE.to_string(),
    };

    format!(
        "Provide a summary of the water fluoridation data for '{}' in {} for the year {}. \
         This CWS had the highest monthly adjusted fluoride level, recorded at {:.2} mg/L, \
         with a historical average of {:.2} ppm. \
         Please indicate if the data suggests consistency with public health guidelines \
         or if it indicates a need for intervention. {}",
        request.cws_name,
        request.state_name,
        request.year,
        request.max_fluoride,
        request.avg_fluoride,
        additional_info
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(state: &str, max: f64, avg: f64) -> FeedbackRequest {
        FeedbackRequest {
            state_name: state.to_string(),
            year: 2021,
            cws_name: "Columbus Water".to_string(),
            max_fluoride: max,
            avg_fluoride: avg,
        }
    }

    #[test]
    fn test_fallback_when_state_missing() {
        let directory = GuidelineDirectory::from_entries([("Texas", "https://example.org/tx")]);
        let prompt = build_prompt(&directory, &request("Ohio", 0.71, 0.68));

        assert!(prompt.contains(FALLBACK_GUIDANCE));
        assert!(prompt.contains("0.71"));
        assert!(prompt.contains("0.68"));
        assert!(!prompt.contains("refer to: "));
    }

    #[test]
    fn test_specific_url_when_present() {
        let directory = GuidelineDirectory::builtin();
        let prompt = build_prompt(directory, &request("Ohio", 0.71, 0.68));

        assert!(prompt.ends_with("For specific state guidelines, refer to: https://odh.ohio.gov/."));
        assert!(!prompt.contains(FALLBACK_GUIDANCE));
    }

    #[test]
    fn test_two_decimal_formatting() {
        let directory = GuidelineDirectory::default();
        let prompt = build_prompt(&directory, &request("Ohio", 1.0, 0.666666));
        assert!(prompt.contains("recorded at 1.00 mg/L"));
        assert!(prompt.contains("historical average of 0.67 ppm"));

        let prompt = build_prompt(&directory, &request("Ohio", 0.0, 12.3456));
        assert!(prompt.contains("recorded at 0.00 mg/L"));
        assert!(prompt.contains("historical average of 12.35 ppm"));
    }

    #[test]
    fn test_template_verbatim() {
        let directory = GuidelineDirectory::from_entries([("Ohio", "https://odh.ohio.gov/")]);
        let prompt = build_prompt(&directory, &request("Ohio", 0.71, 0.68));
        assert_eq!(
            prompt,
            "Provide a summary of the water fluoridation data for 'Columbus Water' in Ohio for the year 2021. \
             This CWS had the highest monthly adjusted fluoride level, recorded at 0.71 mg/L, with a historical average of 0.68 ppm. \
             Please indicate if the data suggests consistency with public health guidelines or if it indicates a need for intervention. \
             For specific state guidelines, refer to: https://odh.ohio.gov/."
        );
    }
}
