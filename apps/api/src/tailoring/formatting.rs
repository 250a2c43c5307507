//! ATS-hostile formatting checks.
//!
//! Independent of scoring: issues found here are reported next to the score
//! and never change it.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tailoring::models::ResumeBody;

/// Section headers every mainstream ATS parser recognises.
const STANDARD_HEADERS: &[&str] = &[
    "summary",
    "professional summary",
    "profile",
    "experience",
    "professional experience",
    "work experience",
    "employment history",
    "skills",
    "technical skills",
    "core competencies",
    "education",
    "certifications",
    "projects",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingRule {
    Table,
    MultiColumn,
    NonStandardHeader,
    DecorativeGlyph,
    EmptySection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingIssue {
    pub rule: FormattingRule,
    pub location: String,
    pub detail: String,
}

static TABLE_RE: OnceLock<Regex> = OnceLock::new();
static COLUMN_RE: OnceLock<Regex> = OnceLock::new();
static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static GLYPH_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("formatting regex failed to compile: {error}"))
    })
}

fn table_regex() -> &'static Regex {
    // Pipe-delimited cells, markdown separator rows, or tab stops.
    compiled(&TABLE_RE, r"(\|[^|\n]*\|)|(^\s*[-=+]{3,}(\s*[|+]\s*[-=]{3,})+)|\t")
}

fn column_regex() -> &'static Regex {
    compiled(&COLUMN_RE, r"\S {4,}\S")
}

fn header_regex() -> &'static Regex {
    // A short all-caps line, optionally ending in a colon.
    compiled(&HEADER_RE, r"^\s*([A-Z][A-Z &/]{2,40}):?\s*$")
}

fn glyph_regex() -> &'static Regex {
    compiled(
        &GLYPH_RE,
        r"[\x{2190}-\x{21FF}\x{2500}-\x{27BF}\x{2B00}-\x{2BFF}\x{1F300}-\x{1FAFF}]",
    )
}

/// Runs every rule against the body. Issues are reported in field order.
pub fn check_formatting(body: &ResumeBody) -> Vec<FormattingIssue> {
    let mut issues = Vec::new();

    for (location, text) in body.labelled_fields() {
        for line in text.lines() {
            if table_regex().is_match(line) {
                issues.push(issue(FormattingRule::Table, &location, "table or tab layout"));
            }
            if column_regex().is_match(line) {
                issues.push(issue(
                    FormattingRule::MultiColumn,
                    &location,
                    "wide spacing suggests a multi-column layout",
                ));
            }
            let free_text = location == "summary" || location.contains(".achievements[");
            let header = free_text
                .then(|| header_regex().captures(line).and_then(|c| c.get(1)))
                .flatten();
            if let Some(header) = header {
                let name = header.as_str().trim().to_lowercase();
                if !STANDARD_HEADERS.contains(&name.as_str()) {
                    issues.push(issue(
                        FormattingRule::NonStandardHeader,
                        &location,
                        &format!("'{}' is not a standard section header", header.as_str().trim()),
                    ));
                }
            }
            if let Some(glyph) = glyph_regex().find(line) {
                issues.push(issue(
                    FormattingRule::DecorativeGlyph,
                    &location,
                    &format!("decorative character '{}'", glyph.as_str()),
                ));
            }
        }
    }

    if body.summary.trim().is_empty() {
        issues.push(issue(FormattingRule::EmptySection, "summary", "summary is empty"));
    }
    if body.experience.is_empty() {
        issues.push(issue(FormattingRule::EmptySection, "experience", "no experience entries"));
    }
    for (i, entry) in body.experience.iter().enumerate() {
        if entry.achievements.iter().all(|a| a.trim().is_empty()) {
            issues.push(issue(
                FormattingRule::EmptySection,
                &format!("experience[{i}].achievements"),
                "role has no achievements",
            ));
        }
    }
    if body.skills.iter().all(|s| s.trim().is_empty()) {
        issues.push(issue(FormattingRule::EmptySection, "skills", "skills list is empty"));
    }

    issues
}

fn issue(rule: FormattingRule, location: &str, detail: &str) -> FormattingIssue {
    FormattingIssue {
        rule,
        location: location.to_string(),
        detail: detail.to_string(),
    }
}
