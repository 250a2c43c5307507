//! ATS Scorer: 100-point, six-category evidence score for tailored content.
//!
//! Each category earns a share of its fixed weight proportional to how many of
//! its bucketed keywords the content actually mentions:
//!
//!   earned = round_half_up(possible × matched / total)
//!
//! A category with no keywords earns 0 and is flagged `skipped`; its weight is
//! not redistributed, so `sum(possible)` is always 100.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analysis::keywords::KeywordBuckets;
use crate::analysis::taxonomy::{Category, Taxonomy};
use crate::errors::AppError;
use crate::tailoring::formatting::{check_formatting, FormattingIssue};
use crate::tailoring::models::ResumeBody;

const EXCERPT_CHARS: usize = 120;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeightsError {
    #[error("category weights must sum to 100, got {0}")]
    InvalidSum(u32),
    #[error("expected six comma-separated integer weights, got '{0}'")]
    Unparseable(String),
}

/// Immutable per-category point weights. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreWeights {
    core_tech: u32,
    responsibilities: u32,
    tools: u32,
    adjacent_data_stores: u32,
    compliance: u32,
    logistics: u32,
}

impl ScoreWeights {
    pub fn new(
        core_tech: u32,
        responsibilities: u32,
        tools: u32,
        adjacent_data_stores: u32,
        compliance: u32,
        logistics: u32,
    ) -> Result<Self, WeightsError> {
        let sum = core_tech + responsibilities + tools + adjacent_data_stores + compliance + logistics;
        if sum != 100 {
            return Err(WeightsError::InvalidSum(sum));
        }
        Ok(Self {
            core_tech,
            responsibilities,
            tools,
            adjacent_data_stores,
            compliance,
            logistics,
        })
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::CoreTech => self.core_tech,
            Category::Responsibilities => self.responsibilities,
            Category::Tools => self.tools,
            Category::AdjacentDataStores => self.adjacent_data_stores,
            Category::Compliance => self.compliance,
            Category::Logistics => self.logistics,
        }
    }
}

/// Parses `"core,responsibilities,tools,adjacent,compliance,logistics"`,
/// e.g. `"35,25,15,10,10,5"`.
impl FromStr for ScoreWeights {
    type Err = WeightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| WeightsError::Unparseable(s.to_string()))?;
        match parts.as_slice() {
            &[core, resp, tools, adjacent, compliance, logistics] => {
                ScoreWeights::new(core, resp, tools, adjacent, compliance, logistics)
            }
            _ => Err(WeightsError::Unparseable(s.to_string())),
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            core_tech: 35,
            responsibilities: 25,
            tools: 15,
            adjacent_data_stores: 10,
            compliance: 10,
            logistics: 5,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// Where a keyword was found in the tailored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub keyword: String,
    pub location: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub earned: u32,
    pub possible: u32,
    pub evidence: Vec<Evidence>,
    pub missing: Vec<String>,
    /// No keywords were bucketed into this category.
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub categories: Vec<CategoryScore>,
    pub overall: u32,
    pub formatting_issues: Vec<FormattingIssue>,
}

#[cfg(test)]
impl ScoreBreakdown {
    pub fn category(&self, category: Category) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AtsScorer {
    weights: ScoreWeights,
}

impl AtsScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Scores content against the job's keyword buckets.
    ///
    /// Errors with `MalformedContent` when there is no summary, experience or
    /// skills text at all.
    pub fn score(
        &self,
        body: &ResumeBody,
        buckets: &KeywordBuckets,
        taxonomy: &Taxonomy,
    ) -> Result<ScoreBreakdown, AppError> {
        if body.is_blank() {
            return Err(AppError::MalformedContent(
                "Tailored content has no summary, experience, or skills text to score.".to_string(),
            ));
        }

        let fields = body.labelled_fields();
        let categories: Vec<CategoryScore> = Category::ALL
            .into_iter()
            .map(|category| {
                let keywords = buckets.get(category);
                let possible = self.weights.get(category);
                let mut evidence = Vec::new();
                let mut missing = Vec::new();

                for keyword in keywords {
                    let found = fields
                        .iter()
                        .find(|(_, text)| taxonomy.mentions(text, keyword));
                    match found {
                        Some((location, text)) => evidence.push(Evidence {
                            keyword: keyword.clone(),
                            location: location.clone(),
                            excerpt: text.chars().take(EXCERPT_CHARS).collect(),
                        }),
                        None => missing.push(keyword.clone()),
                    }
                }

                CategoryScore {
                    category,
                    earned: earned_points(possible, evidence.len(), keywords.len()),
                    possible,
                    evidence,
                    missing,
                    skipped: keywords.is_empty(),
                }
            })
            .collect();

        let overall = categories.iter().map(|c| c.earned).sum();
        debug!("ATS score {overall}/100");

        Ok(ScoreBreakdown {
            categories,
            overall,
            formatting_issues: check_formatting(body),
        })
    }
}

/// `round(possible × matched / total)` with halves rounded up, in integers.
fn earned_points(possible: u32, matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let (possible, matched, total) = (possible as u64, matched as u64, total as u64);
    ((2 * possible * matched + total) / (2 * total)) as u32
}
