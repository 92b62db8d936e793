use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One feedback submission. Immutable once created; only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub origin: String,
    pub rating: Option<u8>,
}

impl FeedbackRecord {
    /// ISO-8601 timestamp as written to the sink.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Row cells in sink column order: timestamp, text, origin, rating (blank when absent).
    pub fn to_row(&self) -> [String; 4] {
        [
            self.timestamp_iso(),
            self.text.clone(),
            self.origin.clone(),
            self.rating.map(|r| r.to_string()).unwrap_or_default(),
        ]
    }
}
