pub mod export;
pub mod submission;

pub use export::export_submission_to_csv;
pub use submission::{validate_submission, FormSubmission, FormSubmissionRequest};
