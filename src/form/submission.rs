use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::assign::{Availability, Participant};
use crate::parser::SurveyResponse;

/// Stored survey submission, one per accepted form post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub timestamp: String,
    pub section: String,
    pub name: String,
    pub response_id: String,
    pub submission_type: String, // "New submission" or "Re-Submission"
    pub grade: u8,
    pub availability: String,
    pub pr_choice: Option<String>,
    pub notes: Option<String>,
}

/// Survey submission request from the frontend
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissionRequest {
    pub section: String,
    pub name: String,
    pub response_id: String,
    pub submission_type: String,
    pub grade: u8,
    pub availability: String,
    pub pr_choice: Option<String>,
    pub notes: Option<String>,
}

/// Validates a survey submission
pub fn validate_submission(req: &FormSubmissionRequest) -> Result<(), String> {
    if req.name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if req.response_id.trim().is_empty() {
        return Err("Student ID is required".to_string());
    }
    if !req.response_id.trim().chars().all(|c| c.is_ascii_digit()) {
        return Err("Student ID must contain only digits".to_string());
    }

    if req.section.trim().is_empty() {
        return Err("Section selection is required".to_string());
    }

    if req.submission_type != "New submission" && req.submission_type != "Re-Submission" {
        return Err("Invalid submission type".to_string());
    }

    if !(1..=4).contains(&req.grade) {
        return Err(format!("Invalid grade: {}", req.grade));
    }

    if Availability::parse(&req.availability).is_none() {
        return Err(format!("Invalid availability: {}", req.availability));
    }

    if let Some(choice) = req.pr_choice.as_deref() {
        let choice = choice.trim().to_lowercase();
        if !choice.is_empty() && choice != "join" && choice != "none" {
            return Err(format!("Invalid PR day choice: {}", choice));
        }
    }

    Ok(())
}

impl FormSubmission {
    /// Stamps a validated request into the stored shape
    pub fn from_request(req: &FormSubmissionRequest) -> FormSubmission {
        FormSubmission {
            timestamp: Utc::now().to_rfc3339(),
            section: req.section.trim().to_string(),
            name: req.name.trim().to_string(),
            response_id: req.response_id.trim().to_string(),
            submission_type: req.submission_type.clone(),
            grade: req.grade,
            availability: req.availability.clone(),
            pr_choice: req.pr_choice.clone(),
            notes: req.notes.clone(),
        }
    }

    /// The in-memory shape the importer would have produced for this row
    pub fn to_response(&self) -> SurveyResponse {
        SurveyResponse {
            participant: Participant {
                response_id: self.response_id.clone(),
                name: self.name.clone(),
                section: self.section.clone(),
                grade: self.grade,
                availability: Availability::parse(&self.availability),
            },
            pr_choice: self
                .pr_choice
                .clone()
                .filter(|c| !c.trim().is_empty()),
        }
    }
}
