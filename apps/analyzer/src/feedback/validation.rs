use serde::Serialize;
use thiserror::Error;

pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Content rules for a feedback submission.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackRules {
    /// Minimum characters after trimming surrounding whitespace.
    pub min_chars: usize,
}

impl Default for FeedbackRules {
    fn default() -> Self {
        Self { min_chars: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidFeedback {
    #[error("feedback must be at least {min_chars} characters")]
    TooShort { min_chars: usize },

    #[error("rating must be between 1 and 5, got {rating}")]
    RatingOutOfRange { rating: i64 },
}

/// Validates the text (and optional rating) of a submission.
/// Length counts characters, not bytes.
pub fn validate(
    text: &str,
    rating: Option<i64>,
    rules: &FeedbackRules,
) -> Result<(), InvalidFeedback> {
    if text.trim().chars().count() < rules.min_chars {
        return Err(InvalidFeedback::TooShort {
            min_chars: rules.min_chars,
        });
    }
    if let Some(rating) = rating {
        let in_range = u8::try_from(rating)
            .map(|r| RATING_RANGE.contains(&r))
            .unwrap_or(false);
        if !in_range {
            return Err(InvalidFeedback::RatingOutOfRange { rating });
        }
    }
    Ok(())
}
