use chrono::Utc;
use uuid::Uuid;

use crate::db::PersistedValue;
use crate::error::Result;
use crate::models::{
    Analysis, AnalysisInput, AnalysisInputUpdate, ResearchItem, SubmissionInput,
};
use crate::processing::build_result;

const COPY_SUFFIX: &str = " (copy)";

/// The ordered, newest-first collection of analyses plus the active pointer.
///
/// Mutations are synchronous and only touch memory; [`AnalysisStore::flush`] writes the
/// whole collection back under its storage key.
pub struct AnalysisStore {
    slot: PersistedValue<Vec<Analysis>>,
    analyses: Vec<Analysis>,
    active_id: Option<String>,
}

impl AnalysisStore {
    pub async fn load(slot: PersistedValue<Vec<Analysis>>) -> Self {
        let analyses = slot.load().await;
        tracing::debug!(key = %slot.key(), count = analyses.len(), "Loaded analysis history");

        Self {
            slot,
            analyses,
            active_id: None,
        }
    }

    pub async fn flush(&self) -> Result<()> {
        self.slot.save(&self.analyses).await
    }

    pub fn analyses(&self) -> &[Analysis] {
        &self.analyses
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Analysis> {
        self.analyses.iter().find(|a| a.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Analysis> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.analyses.iter().position(|a| a.id() == id)
    }

    /// Builds a new analysis from normalized items, puts it first and makes it active.
    pub fn create(
        &mut self,
        submission: &SubmissionInput,
        patents: Vec<ResearchItem>,
        publications: Vec<ResearchItem>,
        aggregate_novelty: f64,
    ) -> Analysis {
        let analysis = Analysis {
            input: AnalysisInput::new(submission),
            result: build_result(patents, publications, aggregate_novelty),
        };

        self.analyses.insert(0, analysis.clone());
        self.active_id = Some(analysis.id().to_string());

        tracing::info!(
            analysis_id = %analysis.id(),
            items = analysis.result.item_count(),
            "Analysis created"
        );
        analysis
    }

    /// Shallow-merges the given fields into the input. Unknown ids are ignored.
    pub fn update_metadata(&mut self, id: &str, update: AnalysisInputUpdate) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        let input = &mut self.analyses[index].input;
        if let Some(title) = update.title {
            input.title = title;
        }
        if let Some(abstract_text) = update.abstract_text {
            input.abstract_text = abstract_text;
        }
        if let Some(updated_at) = update.updated_at {
            input.updated_at = Some(updated_at);
        }
        true
    }

    pub fn rename(&mut self, id: &str, title: &str) -> bool {
        self.update_metadata(id, AnalysisInputUpdate::title(title))
    }

    /// Replaces input text and result together. Returns `None` for unknown ids.
    pub fn apply_recompute(
        &mut self,
        id: &str,
        submission: &SubmissionInput,
        patents: Vec<ResearchItem>,
        publications: Vec<ResearchItem>,
        aggregate_novelty: f64,
    ) -> Option<Analysis> {
        let index = self.position(id)?;
        let result = build_result(patents, publications, aggregate_novelty);

        let analysis = &mut self.analyses[index];
        analysis.input.title = submission.title.clone();
        analysis.input.abstract_text = submission.abstract_text.clone();
        analysis.input.updated_at = Some(Utc::now());
        analysis.result = result;

        tracing::info!(analysis_id = %id, "Analysis recomputed");
        Some(analysis.clone())
    }

    /// Copies an analysis under a new id at the head of the collection and activates it.
    pub fn duplicate(&mut self, id: &str) -> Option<Analysis> {
        let source = self.get(id)?;

        let copy = Analysis {
            input: AnalysisInput {
                id: Uuid::new_v4().to_string(),
                title: format!("{}{COPY_SUFFIX}", source.input.title),
                abstract_text: source.input.abstract_text.clone(),
                created_at: Utc::now(),
                updated_at: None,
            },
            result: source.result.clone(),
        };

        self.analyses.insert(0, copy.clone());
        self.active_id = Some(copy.id().to_string());

        tracing::info!(source_id = %id, analysis_id = %copy.id(), "Analysis duplicated");
        Some(copy)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        self.analyses.remove(index);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }

        tracing::info!(analysis_id = %id, "Analysis deleted");
        true
    }

    /// Moves the active pointer. Ids not in the collection leave it unchanged.
    pub fn select_active(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            tracing::debug!(analysis_id = %id, "Ignoring selection of unknown analysis");
            return false;
        }
        self.active_id = Some(id.to_string());
        true
    }

    pub fn clear_active(&mut self) {
        self.active_id = None;
    }
}
