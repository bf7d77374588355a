use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::{ItemKind, ResearchItem, ScoredDocument};

/// Patents whose novelty falls below this value carry a license warning.
pub const LICENSE_WARNING_NOVELTY_THRESHOLD: f64 = 60.0;

/// Convert one scored document into a [`ResearchItem`].
///
/// Returns `None` only when the document kind is neither patent nor publication.
/// Every other malformed field degrades to an empty or zero value.
pub fn normalize_document(doc: &ScoredDocument) -> Option<ResearchItem> {
    let kind = match doc.kind.parse::<ItemKind>() {
        Ok(kind) => kind,
        Err(_) => {
            tracing::debug!(document_id = %doc.id, kind = %doc.kind, "Skipping document of unknown kind");
            return None;
        }
    };

    let license_warning = match kind {
        ItemKind::Patent => doc
            .novelty_score
            .filter(|n| n.is_finite())
            .map(|n| n < LICENSE_WARNING_NOVELTY_THRESHOLD),
        ItemKind::Publication => None,
    };

    let (venue, jurisdiction) = match kind {
        ItemKind::Patent => (None, doc.jurisdiction.clone()),
        ItemKind::Publication => (doc.venue.clone(), None),
    };

    Some(ResearchItem {
        id: doc.id.clone(),
        kind,
        title: doc.title.clone(),
        authors_or_assignee: doc.authors.clone(),
        year: extract_year(&doc.publication_date),
        date: doc.publication_date.clone(),
        similarity: similarity_percent(doc.score, doc.novelty_score),
        similarities: doc.similarities.clone().unwrap_or_default(),
        differences: doc.differences.clone().unwrap_or_default(),
        license_warning,
        venue,
        jurisdiction,
        citation_count: doc.citation_count,
        url: doc.url.clone().filter(|u| !u.is_empty()),
    })
}

/// Normalize a batch, splitting it into `(patents, publications)` in source order.
pub fn normalize_documents(docs: &[ScoredDocument]) -> (Vec<ResearchItem>, Vec<ResearchItem>) {
    let mut patents = Vec::new();
    let mut publications = Vec::new();

    for item in docs.iter().filter_map(normalize_document) {
        match item.kind {
            ItemKind::Patent => patents.push(item),
            ItemKind::Publication => publications.push(item),
        }
    }

    (patents, publications)
}

/// Similarity on a 0–100 scale.
///
/// With a per-document novelty score the similarity is its complement. Without one the
/// raw score already measures similarity, either as a fraction (`<= 1`) or a percentage.
pub fn similarity_percent(score: Option<f64>, novelty_score: Option<f64>) -> u8 {
    let raw = match novelty_score.filter(|n| n.is_finite()) {
        Some(novelty) => 100.0 - novelty,
        None => match score.filter(|s| s.is_finite()) {
            Some(s) if s <= 1.0 => s * 100.0,
            Some(s) => s,
            None => 0.0,
        },
    };

    raw.round().clamp(0.0, 100.0) as u8
}

/// Calendar year of a source date, or 0 when the date cannot be read.
pub fn extract_year(date: &str) -> i32 {
    parse_date(date).map(|d| d.year()).filter(|y| *y >= 0).unwrap_or(0)
}

pub(crate) fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{date}-01"), "%Y-%m-%d") {
        return Some(d);
    }
    if date.len() == 4 && date.bytes().all(|b| b.is_ascii_digit()) {
        return date
            .parse::<i32>()
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }

    None
}
