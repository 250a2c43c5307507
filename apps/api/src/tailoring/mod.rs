// Tailoring: truth-constrained content generation, ATS scoring, coverage, gap questions.
// All LLM calls go through llm_client::ContentOracle; scoring and coverage are pure.

pub mod ats_scorer;
pub mod content_generator;
pub mod coverage;
pub mod formatting;
pub mod gap_analyzer;
pub mod micro_edits;
pub mod models;
pub mod prompts;
pub mod truthfulness;
