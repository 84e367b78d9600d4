use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier assigned to a quiz by the remote service
pub type QuizId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub summary: String,
    pub wikipedia_url: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>, // Display and numbering order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One row of the history list; a projection of `Quiz` without its questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: QuizId,
    pub title: String,
    pub wikipedia_url: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateQuizRequest {
    pub wikipedia_url: String,
    pub num_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

/// Failure body returned by the service. Only a string `detail` is meaningful to the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    pub detail: Option<serde_json::Value>,
}

impl ErrorPayload {
    pub fn detail_message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|detail| detail.as_str())
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
    }
}

impl Question {
    /// True when there are at least two unique options and `correct_answer` matches exactly one of them
    pub fn has_valid_answer_key(&self) -> bool {
        let unique: HashSet<&str> = self.options.iter().map(String::as_str).collect();
        self.options.len() >= 2
            && unique.len() == self.options.len()
            && unique.contains(self.correct_answer.as_str())
    }

    pub fn is_correct_option(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }
}

impl Quiz {
    /// Indices of questions whose answer key is inconsistent with their options
    pub fn answer_key_violations(&self) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, question)| !question.has_valid_answer_key())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn summary_row(&self) -> QuizSummary {
        QuizSummary {
            id: self.id,
            title: self.title.clone(),
            wikipedia_url: self.wikipedia_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// `created_at` arrives either as RFC 3339 or as a naive ISO-8601 date-time, which is read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid timestamp '{}'", raw))
        })
    }
}
