// Shared helpers for the integration suites
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use valorize::config::StorageConfig;
use valorize::db::{KeyValueStore, MemoryBackend};
use valorize::error::{Result, ValorizeError};
use valorize::models::{ScoredDocument, ScoringRequest, ScoringResponse};
use valorize::scoring::ScoringBackend;
use valorize::services::{RequestPhase, RequestTarget};
use valorize::AnalysisService;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn document(id: &str, kind: &str, novelty: Option<f64>, authors: &[&str]) -> ScoredDocument {
    ScoredDocument {
        id: id.to_string(),
        title: format!("Prior art {id}"),
        kind: kind.to_string(),
        score: Some(0.5),
        url: Some(format!("https://example.org/{id}")),
        publication_date: "2021-04-12".to_string(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        novelty_score: novelty,
        ..Default::default()
    }
}

pub fn response(documents: Vec<ScoredDocument>, novelty: f64) -> ScoringResponse {
    ScoringResponse {
        documents,
        novelty_score: novelty,
        novelty_analysis: "Analysis text".to_string(),
        ..Default::default()
    }
}

/// A response with one patent and one publication.
pub fn mixed_response(novelty: f64) -> ScoringResponse {
    response(
        vec![
            document("P1", "patent", Some(35.0), &["Acme Corp"]),
            document("W1", "publication", None, &["Kim", "Acme Corp"]),
        ],
        novelty,
    )
}

/// The same payload as the service sends it over the wire.
pub fn response_body(novelty: f64) -> Value {
    json!({
        "documents": [
            {
                "id": "P1",
                "title": "Layered cathode",
                "type": "patent",
                "score": 0.71,
                "url": "https://patents.example.org/P1",
                "abstract": "A cathode.",
                "publication_date": "2019-03-02",
                "authors": ["Acme Corp"],
                "novelty_score": 40.0
            },
            {
                "id": "W1",
                "title": "Solid electrolytes",
                "type": "publication",
                "score": 0.33,
                "url": "https://works.example.org/W1",
                "abstract": null,
                "publication_date": "2022-11-20",
                "authors": ["Kim"],
                "institutions": ["KAIST"],
                "similarities": ["Same chemistry"],
                "differences": null,
                "novelty_score": null
            }
        ],
        "novelty_score": novelty,
        "novetly_analysis": "Moderately novel.",
        "publication_dates": ["2019-03-02", "2022-11-20"],
        "authors": [{"name": "Kim", "number_of_publications": 1}]
    })
}

/// Scorer answering every request from a closure.
pub struct FnScorer<F>(pub F);

#[async_trait]
impl<F> ScoringBackend for FnScorer<F>
where
    F: Fn(&ScoringRequest) -> Result<ScoringResponse> + Send + Sync,
{
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse> {
        (self.0)(request)
    }
}

pub fn scorer_fn<F>(f: F) -> Arc<dyn ScoringBackend>
where
    F: Fn(&ScoringRequest) -> Result<ScoringResponse> + Send + Sync + 'static,
{
    Arc::new(FnScorer(f))
}

pub fn fixed_scorer(novelty: f64) -> Arc<dyn ScoringBackend> {
    scorer_fn(move |_| Ok(mixed_response(novelty)))
}

pub fn failing_scorer() -> Arc<dyn ScoringBackend> {
    scorer_fn(|_| Err(ValorizeError::Transport("connection refused".to_string())))
}

/// Scorer that holds each request until the test releases the gate for its title.
#[derive(Default)]
pub struct GatedScorer {
    gates: Mutex<HashMap<String, oneshot::Receiver<Result<ScoringResponse>>>>,
}

impl GatedScorer {
    pub fn gate(&self, title: &str) -> oneshot::Sender<Result<ScoringResponse>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(title.to_string(), rx);
        tx
    }
}

#[async_trait]
impl ScoringBackend for GatedScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse> {
        let gate = self.gates.lock().unwrap().remove(&request.title);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ValorizeError::Transport("gate dropped".to_string()))),
            None => Err(ValorizeError::Transport(format!(
                "no gate for {}",
                request.title
            ))),
        }
    }
}

pub fn storage_keys() -> StorageConfig {
    StorageConfig {
        url: ":memory:".to_string(),
        ..Default::default()
    }
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryBackend::new())
}

pub async fn open_service(
    kv: Arc<dyn KeyValueStore>,
    scorer: Arc<dyn ScoringBackend>,
) -> AnalysisService {
    AnalysisService::open(kv, &storage_keys(), scorer).await
}

/// Waits until `target` has an in-flight request for `title`.
pub async fn wait_in_flight(service: &AnalysisService, target: &RequestTarget, title: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let captured = service.captured_input(target).map(|i| i.title);
            if service.request_phase(target) == RequestPhase::InFlight
                && captured.as_deref() == Some(title)
            {
                return;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("request for '{title}' never went in flight"));
}

// Re-export commonly used crates for convenience
pub use serial_test::serial;
pub use tempfile;
pub use wiremock;
