// All LLM prompt templates for the Analysis module.
// Replace `{resume}` with `llm_client::prompts::fenced_resume(..)` output,
// `{skills}` with a comma-joined skill list and `{jd_text}` with the job description.

pub const SCORE_PROMPT: &str = "\
You are an AI resume reviewer. Based on this resume, provide a score from 0 to 100 that reflects \
the overall quality of this resume for job applications.
Consider formatting, clarity, relevance, and overall impression. Just return the number only \
without explanation.

Resume:
{resume}";

pub const SKILLS_PROMPT: &str = "\
You are an AI assistant. Extract and list the key technical and soft skills found in the \
following resume.
Return the skills only, as a comma-separated list.

Resume:
{resume}";

pub const CLASSIFY_SYSTEM: &str =
    "You will return only valid JSON with two keys: 'technical' and 'soft'.";

pub const CLASSIFY_PROMPT: &str = "\
Classify the following skills into two categories: 'Technical Skills' and 'Soft Skills'.
Return the result as JSON with two keys: 'technical' and 'soft'.

Skills: {skills}";

pub const JOB_SUGGESTIONS_PROMPT: &str = "\
You are a career advisor AI. Based on the following resume, suggest 3 specific job titles that \
best match the candidate's profile.
Resume:
{resume}
Return only the job titles, one per line, no numbering or extra text.";

pub const CAREER_PATH_PROMPT: &str = "\
You are a career advisor AI. Based on the resume below, suggest a realistic career path \
progression.
Include 3 to 5 stages with job titles, starting from current level and progressing to senior roles.

Resume:
{resume}";

pub const JD_MATCH_PROMPT: &str = "\
Compare this resume with the following job description. Return:
1. Match percentage (%)
2. Matched skills/keywords
3. Missing important skills or requirements

Resume:
{resume}

Job Description:
{jd_text}";

pub const TIPS_PROMPT: &str = "\
You are a resume reviewer AI. Read this resume and provide 3 specific improvement suggestions to \
make it more attractive for job applications.

Resume:
{resume}";

pub const SCORE_MAX_TOKENS: u32 = 10;
pub const SKILLS_MAX_TOKENS: u32 = 150;
pub const CLASSIFY_MAX_TOKENS: u32 = 800;
pub const JOB_SUGGESTIONS_MAX_TOKENS: u32 = 100;
pub const CAREER_PATH_MAX_TOKENS: u32 = 300;
pub const JD_MATCH_MAX_TOKENS: u32 = 300;
pub const TIPS_MAX_TOKENS: u32 = 250;
