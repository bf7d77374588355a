use std::cmp::Ordering;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::normalizer::parse_date;
use crate::models::{Analysis, ResearchItem};

/// Similarity at which an item counts as a licensing risk.
pub const LICENSE_RISK_SIMILARITY: u8 = 80;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Similarity,
    Date,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Narrowing and ordering applied to one list of research items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilters {
    #[serde(default)]
    pub keyword: String,
    /// Inclusive `(from, to)` year bounds.
    #[serde(default)]
    pub year_range: Option<(i32, i32)>,
    #[serde(default)]
    pub similarity_threshold: u8,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ResultFilters {
    pub fn license_risk_only() -> Self {
        Self {
            similarity_threshold: LICENSE_RISK_SIMILARITY,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.keyword.trim().is_empty() || self.year_range.is_some() || self.similarity_threshold > 0
    }

    pub fn matches(&self, item: &ResearchItem) -> bool {
        let keyword = self.keyword.trim().to_lowercase();
        if !keyword.is_empty() && !item.title.to_lowercase().contains(&keyword) {
            return false;
        }

        if let Some((from, to)) = self.year_range {
            if item.year < from || item.year > to {
                return false;
            }
        }

        item.similarity >= self.similarity_threshold
    }

    pub fn apply<'a>(&self, items: &'a [ResearchItem]) -> Vec<&'a ResearchItem> {
        let mut filtered: Vec<&ResearchItem> = items.iter().filter(|i| self.matches(i)).collect();

        filtered.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortBy::Similarity => a.similarity.cmp(&b.similarity),
                SortBy::Date => compare_dates(&a.date, &b.date),
            };
            match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        filtered
    }
}

// unparseable dates sort before every real date
fn compare_dates(a: &str, b: &str) -> Ordering {
    parse_date(a).cmp(&parse_date(b))
}

/// Analyses whose title contains `query`, case-insensitively, in collection order.
pub fn filter_analyses<'a>(analyses: &'a [Analysis], query: &str) -> Vec<&'a Analysis> {
    let query = query.trim().to_lowercase();
    analyses
        .iter()
        .filter(|a| query.is_empty() || a.input.title.to_lowercase().contains(&query))
        .collect()
}

#[derive(Debug, Default)]
pub struct DayGroups<'a> {
    pub today: Vec<&'a Analysis>,
    pub yesterday: Vec<&'a Analysis>,
    pub earlier: Vec<&'a Analysis>,
}

/// Bucket analyses by the calendar day they were created, relative to `today`.
pub fn group_by_day<'a>(analyses: &[&'a Analysis], today: NaiveDate) -> DayGroups<'a> {
    let yesterday = today - Duration::days(1);
    let mut groups = DayGroups::default();

    for &analysis in analyses {
        let created = analysis.input.created_at.date_naive();
        if created == today {
            groups.today.push(analysis);
        } else if created == yesterday {
            groups.yesterday.push(analysis);
        } else {
            groups.earlier.push(analysis);
        }
    }

    groups
}
