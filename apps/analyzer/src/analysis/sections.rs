//! Resume analysis sections — one prompt and one post-processor per section.
//!
//! Flow for `analyze`: score → skills → classification → job suggestions →
//! career path, run one after another. A failed section becomes an inline
//! error in the report; the remaining sections still run.

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::classify::{parse_classification, Classification};
use crate::analysis::prompts::*;
use crate::llm_client::prompts::fenced_resume;
use crate::llm_client::{LlmClient, LlmError};

/// Outcome of one report section, rendered as
/// `{"status": "ok", "value": ..}` or `{"status": "error", "message": ..}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Section<T> {
    Ok { value: T },
    Error { message: String },
}

impl<T> Section<T> {
    fn from_result(name: &str, result: Result<T, LlmError>) -> Self {
        match result {
            Ok(value) => Section::Ok { value },
            Err(e) => {
                warn!(section = name, "Analysis section failed: {e}");
                Section::Error {
                    message: section_error_message(&e),
                }
            }
        }
    }
}

fn section_error_message(e: &LlmError) -> String {
    match e {
        LlmError::Timeout(_) => "The AI service took too long to respond".to_string(),
        LlmError::Api { status: 429, .. } => "The AI service is busy, try again later".to_string(),
        _ => "The AI service could not complete this section".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeScore {
    /// The model's answer as returned, e.g. `"85"`.
    pub raw: String,
    /// First integer in the answer, when it falls within 0..=100.
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillBreakdown {
    pub extracted: Vec<String>,
    #[serde(flatten)]
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub score: Section<ResumeScore>,
    pub skills: Section<SkillBreakdown>,
    pub job_suggestions: Section<Vec<String>>,
    pub career_path: Section<String>,
}

fn resume_prompt(template: &str, resume_text: &str) -> String {
    fill_template(template, &[("resume", &fenced_resume(resume_text))])
}

/// Substitutes `{name}` placeholders in a single left-to-right pass. Inserted
/// values are never rescanned, so user text containing `{resume}` or
/// `{jd_text}` stays literal. Unknown braces are copied through.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let var = vars.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match var {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Runs every automatic section for a resume.
pub async fn analyze(llm: &LlmClient, resume_text: &str) -> AnalysisReport {
    let score = Section::from_result("score", score_resume(llm, resume_text).await);
    let skills = Section::from_result("skills", skill_breakdown(llm, resume_text).await);
    let job_suggestions =
        Section::from_result("job_suggestions", suggest_jobs(llm, resume_text).await);
    let career_path = Section::from_result("career_path", career_path(llm, resume_text).await);

    info!(
        score_ok = matches!(score, Section::Ok { .. }),
        skills_ok = matches!(skills, Section::Ok { .. }),
        jobs_ok = matches!(job_suggestions, Section::Ok { .. }),
        career_ok = matches!(career_path, Section::Ok { .. }),
        "Resume analysis finished"
    );

    AnalysisReport {
        score,
        skills,
        job_suggestions,
        career_path,
    }
}

pub async fn score_resume(llm: &LlmClient, resume_text: &str) -> Result<ResumeScore, LlmError> {
    let raw = llm
        .complete(&resume_prompt(SCORE_PROMPT, resume_text), SCORE_MAX_TOKENS)
        .await?;
    Ok(parse_score(&raw))
}

/// Extracts skills, then classifies them. Classification is skipped when
/// extraction finds nothing.
pub async fn skill_breakdown(
    llm: &LlmClient,
    resume_text: &str,
) -> Result<SkillBreakdown, LlmError> {
    let extracted = extract_skills(llm, resume_text).await?;
    let classification = if extracted.is_empty() {
        Classification {
            technical: vec![],
            soft: vec![],
            diagnostic: None,
        }
    } else {
        classify_skills(llm, &extracted).await?
    };
    Ok(SkillBreakdown {
        extracted,
        classification,
    })
}

pub async fn extract_skills(llm: &LlmClient, resume_text: &str) -> Result<Vec<String>, LlmError> {
    let raw = llm
        .complete(&resume_prompt(SKILLS_PROMPT, resume_text), SKILLS_MAX_TOKENS)
        .await?;
    Ok(parse_skill_list(&raw))
}

pub async fn classify_skills(
    llm: &LlmClient,
    skills: &[String],
) -> Result<Classification, LlmError> {
    let prompt = fill_template(CLASSIFY_PROMPT, &[("skills", &skills.join(", "))]);
    let raw = llm
        .complete_with_system(CLASSIFY_SYSTEM, &prompt, CLASSIFY_MAX_TOKENS)
        .await?;
    Ok(parse_classification(&raw))
}

pub async fn suggest_jobs(llm: &LlmClient, resume_text: &str) -> Result<Vec<String>, LlmError> {
    let raw = llm
        .complete(
            &resume_prompt(JOB_SUGGESTIONS_PROMPT, resume_text),
            JOB_SUGGESTIONS_MAX_TOKENS,
        )
        .await?;
    Ok(parse_lines(&raw))
}

pub async fn career_path(llm: &LlmClient, resume_text: &str) -> Result<String, LlmError> {
    llm.complete(
        &resume_prompt(CAREER_PATH_PROMPT, resume_text),
        CAREER_PATH_MAX_TOKENS,
    )
    .await
}

pub async fn match_job_description(
    llm: &LlmClient,
    resume_text: &str,
    jd_text: &str,
) -> Result<String, LlmError> {
    let prompt = fill_template(
        JD_MATCH_PROMPT,
        &[("resume", &fenced_resume(resume_text)), ("jd_text", jd_text)],
    );
    llm.complete(&prompt, JD_MATCH_MAX_TOKENS).await
}

pub async fn improvement_tips(llm: &LlmClient, resume_text: &str) -> Result<String, LlmError> {
    llm.complete(&resume_prompt(TIPS_PROMPT, resume_text), TIPS_MAX_TOKENS)
        .await
}

pub fn parse_score(raw: &str) -> ResumeScore {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let score = digits.parse::<u32>().ok().filter(|s| *s <= 100).map(|s| s as u8);
    ResumeScore {
        raw: raw.trim().to_string(),
        score,
    }
}

pub fn parse_skill_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_score_plain_number() {
        let s = parse_score("85");
        assert_eq!(s.score, Some(85));
        assert_eq!(s.raw, "85");
    }

    #[test]
    fn test_parse_score_with_suffix() {
        assert_eq!(parse_score("Score: 72/100").score, Some(72));
    }

    #[test]
    fn test_parse_score_out_of_range_or_missing() {
        assert_eq!(parse_score("250").score, None);
        assert_eq!(parse_score("excellent").score, None);
        assert_eq!(parse_score("excellent").raw, "excellent");
    }

    #[test]
    fn test_parse_skill_list() {
        assert_eq!(
            parse_skill_list("Python, SQL ,, Leadership,  "),
            vec!["Python", "SQL", "Leadership"]
        );
    }

    #[test]
    fn test_parse_lines_drops_blank_lines() {
        assert_eq!(
            parse_lines("Backend Engineer\n\n  Data Engineer  \r\nSRE\n"),
            vec!["Backend Engineer", "Data Engineer", "SRE"]
        );
    }

    #[test]
    fn test_resume_prompt_fences_resume() {
        let prompt = resume_prompt(TIPS_PROMPT, "Jane Doe");
        assert!(prompt.ends_with("---\nJane Doe\n---"));
        assert!(!prompt.contains("{resume}"));
    }

    #[test]
    fn test_fill_template_does_not_rescan_inserted_text() {
        let prompt = fill_template(
            "R: {resume} | JD: {jd_text}",
            &[("resume", "uses {jd_text} literally"), ("jd_text", "wants {resume}")],
        );
        assert_eq!(prompt, "R: uses {jd_text} literally | JD: wants {resume}");
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        assert_eq!(
            fill_template("{\"a\": {x}} {other}", &[("x", "1")]),
            "{\"a\": 1} {other}"
        );
    }

    #[test]
    fn test_jd_prompt_keeps_placeholder_text_in_resume() {
        let prompt = fill_template(
            JD_MATCH_PROMPT,
            &[("resume", &fenced_resume("Built {jd_text} parsers")), ("jd_text", "Senior Rust role")],
        );
        assert!(prompt.contains("Built {jd_text} parsers"));
        assert_eq!(prompt.matches("Senior Rust role").count(), 1);
    }

    #[test]
    fn test_section_serializes_with_status_tag() {
        let ok: Section<u8> = Section::Ok { value: 7 };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "ok", "value": 7})
        );
        let err: Section<u8> = Section::from_result("score", Err(LlmError::EmptyContent));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "message": "The AI service could not complete this section"})
        );
    }

    fn reply(content: &str) -> String {
        json!({"choices": [{"message": {"content": content}}]}).to_string()
    }

    #[tokio::test]
    async fn test_analyze_isolates_failed_sections() {
        let mut server = mockito::Server::new_async().await;
        // Score and job suggestions succeed; every other call fails.
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("provide a score".to_string()))
            .with_status(200)
            .with_body(reply("81"))
            .create_async()
            .await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("suggest 3 specific job titles".to_string()))
            .with_status(200)
            .with_body(reply("Platform Engineer\nSRE"))
            .create_async()
            .await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let llm = LlmClient::new("k".to_string(), &server.url(), Duration::from_secs(5)).unwrap();
        let report = analyze(&llm, "Jane Doe, Rust").await;

        assert!(matches!(report.score, Section::Ok { ref value } if value.score == Some(81)));
        assert!(
            matches!(report.job_suggestions, Section::Ok { ref value } if value == &vec!["Platform Engineer".to_string(), "SRE".to_string()])
        );
        assert!(matches!(report.skills, Section::Error { .. }));
        assert!(matches!(report.career_path, Section::Error { .. }));
    }

    #[tokio::test]
    async fn test_skill_breakdown_classifies_extracted_skills() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("comma-separated list".to_string()))
            .with_status(200)
            .with_body(reply("Python, Communication"))
            .create_async()
            .await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("Skills: Python, Communication".to_string()))
            .with_status(200)
            .with_body(reply(
                "```json\n{\"technical\": [\"Python\"], \"soft\": [\"Communication\"]}\n```",
            ))
            .create_async()
            .await;

        let llm = LlmClient::new("k".to_string(), &server.url(), Duration::from_secs(5)).unwrap();
        let breakdown = skill_breakdown(&llm, "resume").await.unwrap();

        assert_eq!(breakdown.extracted, vec!["Python", "Communication"]);
        assert_eq!(breakdown.classification.technical, vec!["Python"]);
        assert_eq!(breakdown.classification.soft, vec!["Communication"]);
    }
}
