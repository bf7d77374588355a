pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod processing;
pub mod scoring;
pub mod services;

pub use config::Config;
pub use error::{Result, ValorizeError};
pub use services::{AnalysisService, RequestOutcome};
