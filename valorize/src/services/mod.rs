mod analysis;
mod history;
mod orchestrator;
mod ui_state;

pub use analysis::{AnalysisService, RequestOutcome};
pub use history::AnalysisStore;
pub use orchestrator::{RequestOrchestrator, RequestPhase, RequestTarget, RequestTicket};
pub use ui_state::UiStateManager;
