use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::SubmissionInput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringRequest {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl From<&SubmissionInput> for ScoringRequest {
    fn from(input: &SubmissionInput) -> Self {
        Self {
            title: input.title.clone(),
            abstract_text: input.abstract_text.clone(),
        }
    }
}

/// A document as returned by the scoring service. Only `id` is required; the
/// normalizer turns the rest into a [`super::ResearchItem`]. A field of the
/// wrong type reads as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(rename = "abstract", default, deserialize_with = "lenient")]
    pub abstract_text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub publication_date: String,
    #[serde(default, deserialize_with = "lenient")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub institutions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub similarities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub differences: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub novelty_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub jurisdiction: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub citation_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorPublicationCount {
    pub name: String,
    pub number_of_publications: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoringResponse {
    #[serde(deserialize_with = "usable_documents")]
    pub documents: Vec<ScoredDocument>,
    /// Average novelty across documents, 0–100.
    #[serde(alias = "aggregateNoveltyScore")]
    pub novelty_score: f64,
    #[serde(
        default,
        alias = "novetly_analysis",
        alias = "noveltyAnalysisText",
        deserialize_with = "null_as_default"
    )]
    pub novelty_analysis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publication_dates: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<AuthorPublicationCount>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keeps every document that parses; the rest are dropped individually.
fn usable_documents<'de, D>(deserializer: D) -> Result<Vec<ScoredDocument>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let total = raw.len();
    let documents: Vec<ScoredDocument> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable scored document");
                None
            }
        })
        .collect();
    if documents.len() < total {
        tracing::debug!(kept = documents.len(), total, "Scored documents filtered");
    }
    Ok(documents)
}
