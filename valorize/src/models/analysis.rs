use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::ResearchItem;

/// The `{title, abstract}` pair captured when a request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SubmissionInput {
    #[validate(custom(function = "non_blank"))]
    pub title: String,
    #[serde(rename = "abstract")]
    #[validate(custom(function = "non_blank"))]
    pub abstract_text: String,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl SubmissionInput {
    /// Builds a submission and rejects blank fields before anything is sent out.
    /// The text is kept exactly as typed.
    pub fn new(title: &str, abstract_text: &str) -> crate::error::Result<Self> {
        let input = Self {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
        };
        input.validate()?;
        Ok(input)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AnalysisInput {
    pub fn new(submission: &SubmissionInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: submission.title.clone(),
            abstract_text: submission.abstract_text.clone(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Fields of an [`AnalysisInput`] that may be merged in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisInputUpdate {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AnalysisInputUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopAuthor {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct KindCounts {
    pub publication: u32,
    pub patent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub year: i32,
    pub count: u32,
    pub by_type: KindCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub novelty_percent: u8,
    pub max_similarity: u8,
    pub patents: Vec<ResearchItem>,
    pub publications: Vec<ResearchItem>,
    pub top_authors: Vec<TopAuthor>,
    pub timeline: Vec<TimelineEntry>,
}

impl AnalysisResult {
    pub fn item_count(&self) -> usize {
        self.patents.len() + self.publications.len()
    }

    pub fn novelty_level(&self) -> NoveltyLevel {
        NoveltyLevel::from_percent(self.novelty_percent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub input: AnalysisInput,
    pub result: AnalysisResult,
}

impl Analysis {
    pub fn id(&self) -> &str {
        &self.input.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyLevel {
    High,
    Moderate,
    Low,
}

impl NoveltyLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            80.. => Self::High,
            40..=79 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for NoveltyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Moderate => write!(f, "moderate"),
            Self::Low => write!(f, "low"),
        }
    }
}
