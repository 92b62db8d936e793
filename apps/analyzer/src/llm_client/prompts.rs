// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Delimits resume text inside prompts so the model treats it as data.
pub const RESUME_FENCE: &str = "---";

/// Wraps resume text between `RESUME_FENCE` lines.
pub fn fenced_resume(resume_text: &str) -> String {
    format!("{RESUME_FENCE}\n{resume_text}\n{RESUME_FENCE}")
}
