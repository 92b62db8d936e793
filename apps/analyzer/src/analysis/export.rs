//! CSV export of an analysis summary.

use chrono::{DateTime, Utc};

const SNIPPET_CHARS: usize = 300;
const HEADER: [&str; 4] = ["timestamp", "resume_snippet", "suggested_jobs", "skills"];

/// Renders a one-row CSV summary: timestamp, the first 300 characters of the
/// resume followed by `...`, and the comma-joined job titles and skills.
pub fn export_csv(
    resume_text: &str,
    job_suggestions: &[String],
    skills: &[String],
    now: DateTime<Utc>,
) -> Result<String, csv::Error> {
    let snippet: String = resume_text.chars().take(SNIPPET_CHARS).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    writer.write_record([
        now.to_rfc3339(),
        format!("{snippet}..."),
        job_suggestions.join(", "),
        skills.join(", "),
    ])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
