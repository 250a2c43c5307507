use std::sync::Arc;

use crate::analysis::taxonomy::Taxonomy;
use crate::config::TailoringConfig;
use crate::llm_client::ContentOracle;
use crate::session::in_flight::InFlightRegistry;
use crate::session::store::SessionStore;
use crate::tailoring::ats_scorer::AtsScorer;
use crate::tailoring::gap_analyzer::GapAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// In-memory when no DATABASE_URL is configured, Postgres otherwise.
    pub store: Arc<dyn SessionStore>,
    /// Production: LlmClient. Tests: a scripted oracle.
    pub oracle: Arc<dyn ContentOracle>,
    pub taxonomy: Arc<Taxonomy>,
    pub scorer: AtsScorer,
    pub gap_analyzer: GapAnalyzer,
    pub tailoring: TailoringConfig,
    pub in_flight: InFlightRegistry,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SessionStore>,
        oracle: Arc<dyn ContentOracle>,
        taxonomy: Arc<Taxonomy>,
        tailoring: TailoringConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            taxonomy,
            scorer: AtsScorer::new(tailoring.score_weights),
            gap_analyzer: GapAnalyzer::new(tailoring.gap_question_cap),
            tailoring,
            in_flight: InFlightRegistry::new(),
        }
    }
}
