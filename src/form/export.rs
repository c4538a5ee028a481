use crate::form::submission::FormSubmission;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Header row of the participants sheet. The importer finds its columns by
/// substring match against these titles, so exports stay readable by
/// `parser::load_responses`.
const SURVEY_CSV_HEADER: &str = "timestamp,Which section or club do you belong to?,What is your name?,What is your student ID? (numbers only),Is this form a...,What grade are you in?,What times are you available on distribution day?,Do you want to join the PR team on promotion day?,Additional notes";

/// Appends a single survey submission to the participants CSV, writing the
/// header row first when the file is new
pub fn export_submission_to_csv(
    submission: &FormSubmission,
    csv_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_exists = csv_path.exists();

    if !file_exists {
        use std::fs::File;
        use std::io::Write;
        let mut header_file = File::create(csv_path)?;
        writeln!(header_file, "{}", SURVEY_CSV_HEADER)?;
    }

    let file = OpenOptions::new().append(true).open(csv_path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    let pr_choice = submission.pr_choice.clone().unwrap_or_default();
    let notes = submission.notes.clone().unwrap_or_default();

    wtr.write_record(&[
        &submission.timestamp,
        &submission.section,
        &submission.name,
        &submission.response_id,
        &submission.submission_type,
        &submission.grade.to_string(),
        &submission.availability,
        &pr_choice,
        &notes,
    ])?;

    wtr.flush()?;
    Ok(())
}
