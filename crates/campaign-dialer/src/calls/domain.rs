use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller sentiment as reported by post-call analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl Sentiment {
    /// Anything other than the three expected words is `Unknown`.
    pub fn from_answer(answer: Option<&str>) -> Self {
        let Some(answer) = answer else {
            return Self::Unknown;
        };
        let word = answer
            .trim()
            .trim_end_matches(|ch: char| ch.is_ascii_punctuation())
            .to_ascii_lowercase();
        match word.as_str() {
            "positive" => Self::Positive,
            "neutral" => Self::Neutral,
            "negative" => Self::Negative,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CallRecord {
    pub call_id: String,
    pub batch_id: Option<String>,
    pub emotion: Option<String>,
    pub from_phone: Option<String>,
    pub to_phone: Option<String>,
    pub call_length: Option<f64>,
    pub completed: Option<bool>,
    pub summary: Option<String>,
    pub call_transcript: Option<String>,
    #[serde(skip_serializing)]
    pub embedding: Option<String>,
    pub followup_scheduled: bool,
    #[serde(rename = "followup_datetime")]
    pub followup_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_answer(self.emotion.as_deref())
    }
}

/// Outcome of one call as delivered by the provider webhook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOutcome {
    pub call_id: String,
    pub batch_id: Option<String>,
    pub emotion: Option<String>,
    pub from_phone: Option<String>,
    pub to_phone: Option<String>,
    pub call_length: Option<f64>,
    pub completed: Option<bool>,
    pub summary: Option<String>,
    pub call_transcript: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFilter {
    pub completed: Option<bool>,
    pub batch_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_is_lenient_about_case_and_punctuation() {
        assert_eq!(Sentiment::from_answer(Some("Neutral")), Sentiment::Neutral);
        assert_eq!(Sentiment::from_answer(Some(" positive. ")), Sentiment::Positive);
        assert_eq!(Sentiment::from_answer(Some("NEGATIVE")), Sentiment::Negative);
        assert_eq!(Sentiment::from_answer(Some("mixed")), Sentiment::Unknown);
        assert_eq!(Sentiment::from_answer(None), Sentiment::Unknown);
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Sentiment::Neutral).unwrap(),
            serde_json::json!("neutral")
        );
        assert_eq!(Sentiment::Unknown.as_str(), "unknown");
    }
}
