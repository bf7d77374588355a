mod analysis;
mod research;
mod scoring;
mod ui_state;

pub use analysis::*;
pub use research::*;
pub use scoring::*;
pub use ui_state::*;
