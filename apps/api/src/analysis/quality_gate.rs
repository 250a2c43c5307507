//! Quality Gate: advisory checks that a job description is substantial and role-specific.
//!
//! The gate never blocks the pipeline. A failing result is surfaced as an
//! `InputTooSparse` warning so the caller can tell the user that matching
//! quality may be degraded.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::analysis::taxonomy::Taxonomy;

/// Phrases that mark a sentence as boilerplate rather than role content.
const BOILERPLATE_MARKERS: &[&str] = &[
    "equal opportunity employer",
    "without regard to",
    "reasonable accommodation",
    "race, color",
    "sexual orientation",
    "veteran status",
    "401(k)",
    "paid time off",
    "pto",
    "health insurance",
    "dental",
    "vision insurance",
    "parental leave",
    "benefits package",
    "competitive salary",
    "salary range",
    "perks",
    "e-verify",
    "background check",
    "drug-free",
];

/// Tunable thresholds. The defaults were tuned on database-administration
/// postings and are not assumed to generalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub min_chars: usize,
    pub min_role_terms: usize,
    pub min_term_density: f64,
    pub max_boilerplate_ratio: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_chars: 3_000,
            min_role_terms: 5,
            min_term_density: 0.005,
            max_boilerplate_ratio: 0.5,
        }
    }
}

/// Outcome of the three independent gate checks, with the measurements behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateResult {
    pub sufficient_length: bool,
    pub role_specific: bool,
    pub not_generic: bool,
    pub char_count: usize,
    pub word_count: usize,
    /// Distinct domain terms found outside boilerplate sentences.
    pub role_term_count: usize,
    /// Domain-term occurrences per word.
    pub term_density: f64,
    /// Share of characters that sit in boilerplate sentences.
    pub boilerplate_ratio: f64,
    pub thresholds: QualityThresholds,
}

impl QualityGateResult {
    pub fn passed(&self) -> bool {
        self.sufficient_length && self.role_specific && self.not_generic
    }

    /// Actionable explanations for every failed check.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.sufficient_length {
            warnings.push(format!(
                "The job description is {} characters; at least {} are needed for reliable keyword matching. Paste the full posting, including responsibilities and requirements.",
                self.char_count, self.thresholds.min_chars
            ));
        }
        if !self.role_specific {
            warnings.push(format!(
                "Only {} role-specific terms were found (expected at least {}). Make sure the technical requirements section is included.",
                self.role_term_count, self.thresholds.min_role_terms
            ));
        }
        if !self.not_generic {
            warnings.push(
                "The posting reads like a generic template (mostly company or benefits copy). Matching quality may be degraded."
                    .to_string(),
            );
        }
        warnings
    }
}

/// Runs all three checks. Never fails.
pub fn evaluate(
    jd_text: &str,
    taxonomy: &Taxonomy,
    thresholds: &QualityThresholds,
) -> QualityGateResult {
    let char_count = jd_text.chars().count();
    let word_count = jd_text.split_whitespace().count();

    let (boilerplate, substantive) = partition_sentences(jd_text);
    let boilerplate_chars: usize = boilerplate.iter().map(|s| s.chars().count()).sum();
    let boilerplate_ratio = if char_count == 0 {
        0.0
    } else {
        boilerplate_chars as f64 / char_count as f64
    };

    let substantive_text = substantive.join(" ");
    let hits = taxonomy.scan(&substantive_text);
    let role_term_count = hits.iter().map(|h| h.term).collect::<HashSet<_>>().len();
    let term_density = if word_count == 0 {
        0.0
    } else {
        hits.len() as f64 / word_count as f64
    };

    QualityGateResult {
        sufficient_length: char_count >= thresholds.min_chars,
        role_specific: role_term_count >= thresholds.min_role_terms,
        not_generic: boilerplate_ratio <= thresholds.max_boilerplate_ratio
            && term_density >= thresholds.min_term_density,
        char_count,
        word_count,
        role_term_count,
        term_density,
        boilerplate_ratio,
        thresholds: thresholds.clone(),
    }
}

/// Splits text into sentence-ish fragments and separates boilerplate from the rest.
fn partition_sentences(text: &str) -> (Vec<&str>, Vec<&str>) {
    text.split(['.', '\n', '!', '?', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .partition(|s| is_boilerplate(s))
}

fn is_boilerplate(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    BOILERPLATE_MARKERS.iter().any(|m| {
        // Short markers like "pto" must match as whole words.
        if m.len() <= 4 {
            crate::analysis::taxonomy::contains_phrase(&lower, m)
        } else {
            lower.contains(m)
        }
    })
}
