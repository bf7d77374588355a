use crate::db::PersistedValue;
use crate::error::Result;
use crate::models::{AnalysisUiState, ResultsTab, UiState};

/// Presentation flags, kept apart from the analysis collection under their own key.
pub struct UiStateManager {
    slot: PersistedValue<UiState>,
    state: UiState,
}

impl UiStateManager {
    pub async fn load(slot: PersistedValue<UiState>) -> Self {
        let state = slot.load().await;
        Self { slot, state }
    }

    pub async fn flush(&self) -> Result<()> {
        self.slot.save(&self.state).await
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.state.sidebar_collapsed
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.state.sidebar_collapsed = !self.state.sidebar_collapsed;
        self.state.sidebar_collapsed
    }

    pub fn analysis_state(&self, id: &str) -> AnalysisUiState {
        self.state.per_analysis.get(id).cloned().unwrap_or_default()
    }

    fn entry(&mut self, id: &str) -> &mut AnalysisUiState {
        self.state.per_analysis.entry(id.to_string()).or_default()
    }

    pub fn set_abstract_expanded(&mut self, id: &str, expanded: bool) {
        self.entry(id).abstract_expanded = Some(expanded);
    }

    pub fn set_results_tab(&mut self, id: &str, tab: ResultsTab) {
        self.entry(id).results_tab = Some(tab);
    }

    pub fn set_show_all_results(&mut self, id: &str, show_all: bool) {
        self.entry(id).show_all_results = Some(show_all);
    }

    /// Drops everything remembered for a deleted analysis.
    pub fn forget(&mut self, id: &str) -> bool {
        self.state.per_analysis.remove(id).is_some()
    }
}
