// Job analysis: quality gate, role classification, keyword bucketing.
// Fully deterministic. No LLM calls in this module.

pub mod job;
pub mod keywords;
pub mod quality_gate;
pub mod role_classifier;
pub mod taxonomy;
