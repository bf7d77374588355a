use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultsTab {
    Patents,
    Publications,
}

/// Presentation flags remembered per analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisUiState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_tab: Option<ResultsTab>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_all_results: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_expanded: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub per_analysis: HashMap<String, AnalysisUiState>,
}
