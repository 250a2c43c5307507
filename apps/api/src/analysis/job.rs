//! Job ingestion and analysis: QualityGate → RoleClassifier → KeywordBucketizer.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::keywords::{bucketize, KeywordBuckets};
use crate::analysis::quality_gate::{self, QualityGateResult, QualityThresholds};
use crate::analysis::role_classifier::{classify, RoleArchetype, WeightingHints};
use crate::analysis::taxonomy::Taxonomy;

const MAX_REQUIREMENTS: usize = 25;
const MAX_TITLE_CHARS: usize = 120;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Raw job input. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Where the text came from, if it was fetched from a URL. Provenance only.
    pub source_url: Option<String>,
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    pub ingested_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn ingest(text: impl Into<String>, source_url: Option<String>) -> Self {
        let text = text.into();
        Self {
            source_url,
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            text,
            ingested_at: Utc::now(),
        }
    }
}

/// Structured result of analyzing one job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub title: String,
    pub company: Option<String>,
    pub archetype: RoleArchetype,
    pub weighting_hints: WeightingHints,
    pub requirements: Vec<String>,
    pub keywords: KeywordBuckets,
    pub quality: QualityGateResult,
}

/// Non-fatal conditions surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineWarning {
    InputTooSparse { messages: Vec<String> },
}

impl JobAnalysis {
    pub fn warnings(&self) -> Vec<PipelineWarning> {
        if self.quality.passed() {
            Vec::new()
        } else {
            vec![PipelineWarning::InputTooSparse {
                messages: self.quality.warnings(),
            }]
        }
    }
}

/// Optional caller-supplied metadata. Inferred from the text when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobMetadata {
    pub title: Option<String>,
    pub company: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

/// Runs the deterministic analysis stages. Never fails: quality problems are
/// reported on the result, not raised.
pub fn analyze_job(
    posting: &JobPosting,
    metadata: &JobMetadata,
    taxonomy: &Taxonomy,
    thresholds: &QualityThresholds,
) -> JobAnalysis {
    let quality = quality_gate::evaluate(&posting.text, taxonomy, thresholds);
    if !quality.passed() {
        warn!(
            "Job description failed quality gate (length={}, role_specific={}, not_generic={})",
            quality.sufficient_length, quality.role_specific, quality.not_generic
        );
    }

    let title = metadata
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| infer_title(&posting.text));
    let company = metadata
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or_else(|| infer_company(&posting.text));

    let archetype = classify(&posting.text, &title);
    let keywords = bucketize(&posting.text, archetype, taxonomy);
    let requirements = extract_requirements(&posting.text);

    info!(
        "Analyzed job '{}': archetype={:?}, keywords={}, requirements={}",
        title,
        archetype,
        keywords.total(),
        requirements.len()
    );

    JobAnalysis {
        title,
        company,
        archetype,
        weighting_hints: archetype.hints(),
        requirements,
        keywords,
        quality,
    }
}

/// First non-empty line, trimmed to a sane length.
fn infer_title(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(MAX_TITLE_CHARS).collect())
        .unwrap_or_default()
}

static ABOUT_RE: OnceLock<Regex> = OnceLock::new();
static HIRING_RE: OnceLock<Regex> = OnceLock::new();
static BULLET_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|error| panic!("job regex failed to compile: {error}"))
    })
}

/// Looks for "About <Company>" or "<Company> is hiring" style lines.
fn infer_company(text: &str) -> Option<String> {
    let patterns = [
        compiled(&ABOUT_RE, r"(?m)^\s*About\s+([A-Z][\w&.\- ]{1,60}?)\s*[:\n]"),
        compiled(
            &HIRING_RE,
            r"(?m)^\s*([A-Z][\w&.\-]{1,40}(?: [A-Z][\w&.\-]{1,40}){0,3}) is hiring",
        ),
    ];
    patterns.iter().find_map(|re| {
        re.captures(text)?
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .filter(|c| !matches!(c.to_lowercase().as_str(), "us" | "the role" | "you" | "the team"))
    })
}

/// Bulleted lines (`-`, `*`, `•`, or `1.`), deduplicated, in posting order.
pub fn extract_requirements(text: &str) -> Vec<String> {
    let bullet = compiled(&BULLET_RE, r"^\s*(?:[-*•▪◦]|\d{1,2}[.)])\s+(.+)$");
    let mut requirements: Vec<String> = Vec::new();
    for line in text.lines() {
        let Some(item) = bullet.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };
        let item = item.as_str().trim().trim_end_matches(['.', ';']).to_string();
        if item.len() < 3 || requirements.iter().any(|r| r.eq_ignore_ascii_case(&item)) {
            continue;
        }
        requirements.push(item);
        if requirements.len() >= MAX_REQUIREMENTS {
            break;
        }
    }
    requirements
}
