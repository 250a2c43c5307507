use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tailoring::ats_scorer::ScoreBreakdown;
use crate::tailoring::coverage::CoverageReport;
use crate::tailoring::truthfulness::TruthAssignment;

/// One role on the tailored résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

/// The text body of a résumé, exactly as the oracle returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeBody {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ResumeBody {
    /// Every text field with its path, in reading order.
    pub fn labelled_fields(&self) -> Vec<(String, &str)> {
        let mut fields = vec![("summary".to_string(), self.summary.as_str())];
        for (i, entry) in self.experience.iter().enumerate() {
            fields.push((format!("experience[{i}].title"), entry.title.as_str()));
            fields.push((format!("experience[{i}].company"), entry.company.as_str()));
            fields.push((format!("experience[{i}].duration"), entry.duration.as_str()));
            for (j, achievement) in entry.achievements.iter().enumerate() {
                fields.push((format!("experience[{i}].achievements[{j}]"), achievement.as_str()));
            }
        }
        for (i, skill) in self.skills.iter().enumerate() {
            fields.push((format!("skills[{i}]"), skill.as_str()));
        }
        fields
    }

    /// Every text field, in reading order.
    pub fn text_fields(&self) -> Vec<&str> {
        self.labelled_fields().into_iter().map(|(_, f)| f).collect()
    }

    /// All text fields joined by newlines. Used for coverage and evidence lookups.
    pub fn full_text(&self) -> String {
        self.text_fields().join("\n")
    }

    /// True if there is no summary, experience, or skills text at all.
    pub fn is_blank(&self) -> bool {
        self.text_fields().iter().all(|f| f.trim().is_empty())
    }
}

/// Which cleanup or suggestion a micro edit represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicroEditKind {
    CanonicalCasing,
    Whitespace,
    BulletGlyph,
    DuplicateSkill,
    AddSkill,
    UseFamiliarKeyword,
    QuantifyAchievement,
    ShortenSummary,
}

/// A small, explainable change to generated content.
///
/// Applied edits carry `before`/`after`; suggested edits are advice for the
/// user and leave `after` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroEdit {
    pub kind: MicroEditKind,
    /// Field path, e.g. `skills[3]` or `experience[0].achievements[2]`.
    pub target: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub note: String,
}

/// Immutable snapshot of one tailoring run. A new run replaces it wholesale.
///
/// Holds no truth ladder: omitted keywords never appear in the generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredContent {
    #[serde(flatten)]
    pub body: ResumeBody,
    pub applied_micro_edits: Vec<MicroEdit>,
    pub suggested_micro_edits: Vec<MicroEdit>,
    pub score: ScoreBreakdown,
    pub coverage: CoverageReport,
    pub generated_at: DateTime<Utc>,
}

/// What one tailoring run hands back to the session: the content, and the
/// truth ladder it was generated under.
#[derive(Debug, Clone, PartialEq)]
pub struct TailoringRun {
    pub content: TailoredContent,
    pub truth_assignments: Vec<TruthAssignment>,
}
