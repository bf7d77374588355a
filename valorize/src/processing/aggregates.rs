use std::collections::{BTreeMap, HashMap};

use crate::models::{AnalysisResult, ItemKind, KindCounts, ResearchItem, TimelineEntry, TopAuthor};

pub const TOP_AUTHORS_LIMIT: usize = 10;

/// Authors and assignees ranked by how many items they appear on.
///
/// Counts run over patents first, then publications; equal counts keep first-seen order.
pub fn top_authors(patents: &[ResearchItem], publications: &[ResearchItem]) -> Vec<TopAuthor> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TopAuthor> = Vec::new();

    for name in patents
        .iter()
        .chain(publications)
        .flat_map(|item| item.authors_or_assignee.iter())
    {
        match index.get(name.as_str()) {
            Some(&slot) => counts[slot].score += 1,
            None => {
                index.insert(name.as_str(), counts.len());
                counts.push(TopAuthor {
                    name: name.clone(),
                    score: 1,
                });
            }
        }
    }

    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.score.cmp(&a.score));
    counts.truncate(TOP_AUTHORS_LIMIT);
    counts
}

/// Items per year split by kind, ascending by year.
pub fn timeline(patents: &[ResearchItem], publications: &[ResearchItem]) -> Vec<TimelineEntry> {
    let mut years: BTreeMap<i32, KindCounts> = BTreeMap::new();

    for item in patents.iter().chain(publications) {
        let counts = years.entry(item.year).or_default();
        match item.kind {
            ItemKind::Patent => counts.patent += 1,
            ItemKind::Publication => counts.publication += 1,
        }
    }

    years
        .into_iter()
        .map(|(year, by_type)| TimelineEntry {
            year,
            count: by_type.patent + by_type.publication,
            by_type,
        })
        .collect()
}

pub fn max_similarity(patents: &[ResearchItem], publications: &[ResearchItem]) -> u8 {
    patents
        .iter()
        .chain(publications)
        .map(|item| item.similarity)
        .max()
        .unwrap_or(0)
}

/// Round and clamp the service's aggregate novelty into a 0–100 percentage.
pub fn novelty_percent(aggregate_novelty: f64) -> u8 {
    if !aggregate_novelty.is_finite() {
        return 0;
    }
    aggregate_novelty.clamp(0.0, 100.0).round() as u8
}

pub fn build_result(
    patents: Vec<ResearchItem>,
    publications: Vec<ResearchItem>,
    aggregate_novelty: f64,
) -> AnalysisResult {
    AnalysisResult {
        novelty_percent: novelty_percent(aggregate_novelty),
        max_similarity: max_similarity(&patents, &publications),
        top_authors: top_authors(&patents, &publications),
        timeline: timeline(&patents, &publications),
        patents,
        publications,
    }
}
