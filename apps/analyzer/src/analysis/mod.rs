// Resume analysis: score, skills, job suggestions, career path, JD match, tips, export.
// All LLM calls go through llm_client — no direct API calls here.

pub mod classify;
pub mod export;
pub mod handlers;
pub mod prompts;
pub mod sections;
