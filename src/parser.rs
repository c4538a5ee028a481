use csv::Reader;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assign::{Availability, Participant};

/// One survey response as imported: the engine-facing participant plus the
/// PR-day choice, which the caller owns (the engine never reads it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub participant: Participant,
    /// Raw PR-day answer; "none" means headquarters standby
    pub pr_choice: Option<String>,
}

impl SurveyResponse {
    /// Standby volunteers wait at headquarters on promotion day and are kept
    /// out of auto-assignment entirely
    pub fn is_standby(&self) -> bool {
        self.pr_choice
            .as_deref()
            .map(|c| c.trim().eq_ignore_ascii_case("none"))
            .unwrap_or(false)
    }
}

/// Participants eligible for auto-assignment. Filtering the
/// headquarters-standby opt-outs happens here, before the engine ever sees
/// the roster.
pub fn active_roster(responses: &[SurveyResponse]) -> Vec<Participant> {
    responses
        .iter()
        .filter(|r| !r.is_standby())
        .map(|r| r.participant.clone())
        .collect()
}

/// Parses a grade answer, accepting plain numbers and labels like "3rd year"
fn parse_grade(value: &str) -> Option<u8> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let grade: u8 = digits.parse().ok()?;
    if (1..=4).contains(&grade) {
        Some(grade)
    } else {
        None
    }
}

/// Loads survey responses from a CSV export.
///
/// Column positions are found by header substring so the sheet can gain
/// columns without breaking the import. Rows missing name, ID or a readable
/// grade are skipped; a row marked "Re-Submission" replaces the earlier
/// answers of the same student ID.
pub fn load_responses<P: AsRef<Path>>(
    csv_path: P,
) -> Result<Vec<SurveyResponse>, Box<dyn std::error::Error>> {
    let mut reader = Reader::from_path(csv_path)?;

    let headers = reader.headers()?;
    let section_col = headers
        .iter()
        .position(|h| h.contains("section"))
        .unwrap_or(1);
    let name_col = headers
        .iter()
        .position(|h| h.contains("your name"))
        .unwrap_or(2);
    let id_col = headers
        .iter()
        .position(|h| h.contains("student ID"))
        .unwrap_or(3);
    let submission_type_col = headers
        .iter()
        .position(|h| h.contains("Is this form"))
        .unwrap_or(4);
    let grade_col = headers
        .iter()
        .position(|h| h.contains("grade"))
        .unwrap_or(5);
    let availability_col = headers
        .iter()
        .position(|h| h.contains("available"))
        .unwrap_or(6);
    let pr_col = headers.iter().position(|h| h.contains("PR team"));

    let mut responses: Vec<SurveyResponse> = Vec::new();
    // student ID -> position in `responses`, for re-submission handling
    let mut index: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let record = result?;

        if record.len() < 7 {
            continue; // Skip incomplete records
        }

        let section = record.get(section_col).unwrap_or("").trim().to_string();
        let name = record.get(name_col).unwrap_or("").trim().to_string();
        let response_id = record.get(id_col).unwrap_or("").trim().to_string();
        let submission_type = record
            .get(submission_type_col)
            .unwrap_or("")
            .trim()
            .to_lowercase();

        // Skip if essential fields are missing
        if name.is_empty() || response_id.is_empty() {
            continue;
        }

        // A grade outside 1-4 means a mangled row
        let grade = match parse_grade(record.get(grade_col).unwrap_or("")) {
            Some(grade) => grade,
            None => continue,
        };

        let availability = Availability::parse(record.get(availability_col).unwrap_or(""));
        let pr_choice = pr_col
            .and_then(|col| record.get(col))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let response = SurveyResponse {
            participant: Participant {
                response_id: response_id.clone(),
                name,
                section,
                grade,
                availability,
            },
            pr_choice,
        };

        if let Some(&at) = index.get(&response_id) {
            if submission_type.contains("re-submission") || submission_type.contains("resubmission")
            {
                debug!("re-submission from {} replaces earlier answers", response_id);
            }
            // Either way the latest row wins for a repeated ID
            responses[at] = response;
        } else {
            index.insert(response_id, responses.len());
            responses.push(response);
        }
    }

    Ok(responses)
}
