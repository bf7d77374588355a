pub mod aggregates;
pub mod filters;
pub mod normalizer;

pub use aggregates::build_result;
pub use filters::{filter_analyses, group_by_day, DayGroups, ResultFilters, SortBy, SortOrder};
pub use normalizer::{normalize_document, normalize_documents};
