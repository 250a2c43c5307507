use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::quality_gate::QualityThresholds;
use crate::tailoring::ats_scorer::ScoreWeights;
use crate::tailoring::gap_analyzer::{MAX_GAP_QUESTIONS, MIN_GAP_QUESTIONS};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent → sessions live in memory for the lifetime of the process.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub oracle_timeout: Duration,
    pub tailoring: TailoringConfig,
}

/// Pipeline tunables shared by the handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct TailoringConfig {
    pub quality: QualityThresholds,
    /// Always within 4..=5.
    pub gap_question_cap: usize,
    /// Per-category ATS points, injected into the scorer.
    pub score_weights: ScoreWeights,
}

impl Default for TailoringConfig {
    fn default() -> Self {
        Self {
            quality: QualityThresholds::default(),
            gap_question_cap: MAX_GAP_QUESTIONS,
            score_weights: ScoreWeights::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = QualityThresholds::default();
        let quality = QualityThresholds {
            min_chars: env_or("QUALITY_MIN_CHARS", defaults.min_chars)?,
            min_role_terms: env_or("QUALITY_MIN_ROLE_TERMS", defaults.min_role_terms)?,
            min_term_density: env_or("QUALITY_MIN_TERM_DENSITY", defaults.min_term_density)?,
            max_boilerplate_ratio: env_or(
                "QUALITY_MAX_BOILERPLATE_RATIO",
                defaults.max_boilerplate_ratio,
            )?,
        };
        let gap_question_cap: usize = env_or("GAP_QUESTION_CAP", MAX_GAP_QUESTIONS)?;
        // "core,responsibilities,tools,adjacent,compliance,logistics", summing to 100
        let score_weights: ScoreWeights = env_or("ATS_WEIGHTS", ScoreWeights::default())?;

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            oracle_timeout: Duration::from_secs(env_or("ORACLE_TIMEOUT_SECS", 120)?),
            tailoring: TailoringConfig {
                quality,
                gap_question_cap: gap_question_cap.clamp(MIN_GAP_QUESTIONS, MAX_GAP_QUESTIONS),
                score_weights,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses `key` when set, otherwise returns `default`.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
