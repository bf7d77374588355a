use std::sync::Arc;

use tokio::sync::Mutex;

use super::history::AnalysisStore;
use super::orchestrator::{RequestOrchestrator, RequestPhase, RequestTarget};
use super::ui_state::UiStateManager;
use crate::config::StorageConfig;
use crate::db::{KeyValueStore, PersistedValue};
use crate::error::{Result, ValorizeError};
use crate::models::{
    Analysis, AnalysisInputUpdate, AnalysisUiState, ResearchItem, ResultsTab, ScoringResponse,
    SubmissionInput,
};
use crate::processing::normalize_documents;
use crate::scoring::ScoringBackend;

/// How a scoring request ended from the caller's point of view.
#[derive(Debug)]
pub enum RequestOutcome {
    /// The result was stored; holds the created or recomputed analysis.
    Applied(Analysis),
    /// A newer request on the same target replaced this one. Nothing changed.
    Superseded,
    /// The call failed or found nothing. Nothing changed.
    Failed(ValorizeError),
    /// The analysis to recompute does not exist.
    Missing,
}

impl RequestOutcome {
    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            Self::Applied(analysis) => Some(analysis),
            _ => None,
        }
    }
}

/// Entry point for everything a caller can do with analyses.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<Mutex<AnalysisStore>>,
    ui: Arc<Mutex<UiStateManager>>,
    orchestrator: RequestOrchestrator,
    scorer: Arc<dyn ScoringBackend>,
}

impl AnalysisService {
    pub async fn open(
        kv: Arc<dyn KeyValueStore>,
        storage: &StorageConfig,
        scorer: Arc<dyn ScoringBackend>,
    ) -> Self {
        let store =
            AnalysisStore::load(PersistedValue::new(kv.clone(), storage.history_key.clone())).await;
        let ui = UiStateManager::load(PersistedValue::new(kv, storage.ui_state_key.clone())).await;

        Self {
            store: Arc::new(Mutex::new(store)),
            ui: Arc::new(Mutex::new(ui)),
            orchestrator: RequestOrchestrator::new(),
            scorer,
        }
    }

    /// Scores a new title and abstract and, on success, stores the result as the newest
    /// analysis and makes it active.
    ///
    /// Only blank input is returned as an error. Scoring failures come back as
    /// [`RequestOutcome::Failed`] and leave the collection unchanged.
    pub async fn submit(&self, title: &str, abstract_text: &str) -> Result<RequestOutcome> {
        let input = SubmissionInput::new(title, abstract_text)?;
        let ticket = self.orchestrator.begin(RequestTarget::NewAnalysis, input);
        let response = self.orchestrator.dispatch(&ticket, self.scorer.as_ref()).await;

        let mut store = self.store.lock().await;
        let settled = self.orchestrator.settle(&ticket, || {
            let (patents, publications, novelty) = usable_items(response)?;
            Ok(store.create(ticket.input(), patents, publications, novelty))
        });

        let outcome = match settled {
            None => RequestOutcome::Superseded,
            Some(Ok(analysis)) => {
                persist_history(&store).await;
                RequestOutcome::Applied(analysis)
            }
            Some(Err(e)) => RequestOutcome::Failed(e),
        };
        Ok(outcome)
    }

    /// Edit-and-save-as-new: the edited text becomes a fresh analysis and the one it was
    /// edited from stays as it was.
    pub async fn save_as_new(&self, title: &str, abstract_text: &str) -> Result<RequestOutcome> {
        self.submit(title, abstract_text).await
    }

    /// Edit-and-update-in-place: rescores the edited text and swaps input and result of
    /// `id` together. On failure the analysis keeps its previous input and result.
    pub async fn recompute(
        &self,
        id: &str,
        title: &str,
        abstract_text: &str,
    ) -> Result<RequestOutcome> {
        let input = SubmissionInput::new(title, abstract_text)?;
        if !self.store.lock().await.contains(id) {
            return Ok(RequestOutcome::Missing);
        }

        let ticket = self
            .orchestrator
            .begin(RequestTarget::Existing(id.to_string()), input);
        let response = self.orchestrator.dispatch(&ticket, self.scorer.as_ref()).await;

        let mut store = self.store.lock().await;
        let settled = self.orchestrator.settle(&ticket, || {
            let (patents, publications, novelty) = usable_items(response)?;
            Ok(store.apply_recompute(id, ticket.input(), patents, publications, novelty))
        });

        let outcome = match settled {
            None => RequestOutcome::Superseded,
            Some(Ok(Some(analysis))) => {
                persist_history(&store).await;
                RequestOutcome::Applied(analysis)
            }
            Some(Ok(None)) => RequestOutcome::Missing,
            Some(Err(e)) => RequestOutcome::Failed(e),
        };
        Ok(outcome)
    }

    pub async fn select(&self, id: &str) -> bool {
        self.store.lock().await.select_active(id)
    }

    /// Clears the active analysis so the caller can start a fresh submission.
    pub async fn create_new(&self) {
        self.store.lock().await.clear_active();
    }

    pub async fn rename(&self, id: &str, title: &str) -> bool {
        self.update_metadata(id, AnalysisInputUpdate::title(title))
            .await
    }

    pub async fn update_metadata(&self, id: &str, update: AnalysisInputUpdate) -> bool {
        let mut store = self.store.lock().await;
        let changed = store.update_metadata(id, update);
        if changed {
            persist_history(&store).await;
        }
        changed
    }

    pub async fn duplicate(&self, id: &str) -> Option<Analysis> {
        let mut store = self.store.lock().await;
        let copy = store.duplicate(id)?;
        persist_history(&store).await;
        Some(copy)
    }

    /// Removes an analysis, abandons any recompute running for it and forgets its UI flags.
    pub async fn delete(&self, id: &str) -> bool {
        self.orchestrator
            .cancel(&RequestTarget::Existing(id.to_string()));

        let removed = {
            let mut store = self.store.lock().await;
            let removed = store.delete(id);
            if removed {
                persist_history(&store).await;
            }
            removed
        };

        let mut ui = self.ui.lock().await;
        if ui.forget(id) {
            persist_ui(&ui).await;
        }
        removed
    }

    pub async fn toggle_sidebar(&self) -> bool {
        let mut ui = self.ui.lock().await;
        let collapsed = ui.toggle_sidebar();
        persist_ui(&ui).await;
        collapsed
    }

    pub async fn set_abstract_expanded(&self, id: &str, expanded: bool) {
        let mut ui = self.ui.lock().await;
        ui.set_abstract_expanded(id, expanded);
        persist_ui(&ui).await;
    }

    pub async fn set_results_tab(&self, id: &str, tab: ResultsTab) {
        let mut ui = self.ui.lock().await;
        ui.set_results_tab(id, tab);
        persist_ui(&ui).await;
    }

    pub async fn set_show_all_results(&self, id: &str, show_all: bool) {
        let mut ui = self.ui.lock().await;
        ui.set_show_all_results(id, show_all);
        persist_ui(&ui).await;
    }

    pub async fn analyses(&self) -> Vec<Analysis> {
        self.store.lock().await.analyses().to_vec()
    }

    pub async fn get(&self, id: &str) -> Option<Analysis> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn active(&self) -> Option<Analysis> {
        self.store.lock().await.active().cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    pub async fn sidebar_collapsed(&self) -> bool {
        self.ui.lock().await.sidebar_collapsed()
    }

    pub async fn ui_state(&self, id: &str) -> AnalysisUiState {
        self.ui.lock().await.analysis_state(id)
    }

    pub fn request_phase(&self, target: &RequestTarget) -> RequestPhase {
        self.orchestrator.phase(target)
    }

    pub fn captured_input(&self, target: &RequestTarget) -> Option<SubmissionInput> {
        self.orchestrator.captured_input(target)
    }

    pub fn last_error(&self, target: &RequestTarget) -> Option<String> {
        self.orchestrator.last_error(target)
    }
}

type UsableItems = (Vec<ResearchItem>, Vec<ResearchItem>, f64);

fn usable_items(response: Result<ScoringResponse>) -> Result<UsableItems> {
    let response = response?;
    let (patents, publications) = normalize_documents(&response.documents);
    if patents.is_empty() && publications.is_empty() {
        return Err(ValorizeError::EmptyResult);
    }
    Ok((patents, publications, response.novelty_score))
}

async fn persist_history(store: &AnalysisStore) {
    if let Err(e) = store.flush().await {
        tracing::warn!(error = %e, "Failed to persist analysis history");
    }
}

async fn persist_ui(ui: &UiStateManager) {
    if let Err(e) = ui.flush().await {
        tracing::warn!(error = %e, "Failed to persist UI state");
    }
}
