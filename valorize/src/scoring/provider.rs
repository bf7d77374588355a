use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ScoringRequest, ScoringResponse};

/// Anything that can score a submission against prior art.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse>;
}
