use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Rating {
    Correct,
    Incorrect,
    Ambiguous,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
            Self::Ambiguous => "Ambiguous",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "correct" | "c" => Ok(Self::Correct),
            "incorrect" | "i" => Ok(Self::Incorrect),
            "ambiguous" | "a" => Ok(Self::Ambiguous),
            other => Err(format!(
                "unknown rating '{other}' (expected correct, incorrect or ambiguous)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub request_id: String,
    #[serde(rename = "section")]
    pub section_name: String,
    pub rating: Rating,
    pub comment: String,
}

impl EvaluationRecord {
    pub fn new(
        request_id: impl Into<String>,
        section_name: impl Into<String>,
        rating: Rating,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            section_name: section_name.into(),
            rating,
            comment: comment.into(),
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.request_id, &self.section_name)
    }

    pub fn has_key(&self, request_id: &str, section_name: &str) -> bool {
        self.request_id == request_id && self.section_name == section_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCursor {
    pub request_index: usize,
    pub selected_section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub ambiguous: usize,
}

impl RatingCounts {
    pub fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Correct => self.correct += 1,
            Rating::Incorrect => self.incorrect += 1,
            Rating::Ambiguous => self.ambiguous += 1,
        }
    }
}
