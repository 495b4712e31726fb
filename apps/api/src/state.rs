use std::sync::Arc;
use std::time::Duration;

use crate::generation::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Upper bound for one single-email request, fallbacks included.
    pub generation_timeout: Duration,
    /// Pipelines in flight per bulk request.
    pub bulk_concurrency: usize,
}
