//! Skill classification parsing — turns the model's JSON answer into two lists.
//!
//! Tolerates a surrounding ```json fence. Anything else wrapped around the
//! payload fails to parse, and the caller gets empty lists plus the raw text.

use serde::{Deserialize, Serialize};

use crate::llm_client::strip_json_fences;

#[derive(Debug, Default, Deserialize)]
struct ClassificationPayload {
    #[serde(default)]
    technical: Vec<String>,
    #[serde(default)]
    soft: Vec<String>,
}

/// Why a classification response could not be used, with the offending text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseDiagnostic {
    pub message: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub diagnostic: Option<ParseDiagnostic>,
}

impl Classification {
    fn degraded(message: String, raw: &str) -> Self {
        Self {
            technical: vec![],
            soft: vec![],
            diagnostic: Some(ParseDiagnostic {
                message,
                raw: raw.to_string(),
            }),
        }
    }
}

/// Never fails: malformed output degrades to empty lists with a diagnostic.
pub fn parse_classification(raw: &str) -> Classification {
    let payload = strip_json_fences(raw);
    match serde_json::from_str::<ClassificationPayload>(payload) {
        Ok(parsed) => Classification {
            technical: clean(parsed.technical),
            soft: clean(parsed.soft),
            diagnostic: None,
        },
        Err(e) => {
            tracing::warn!("Failed to parse skill classification: {e}");
            Classification::degraded(format!("Failed to parse skills from AI response: {e}"), payload)
        }
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
