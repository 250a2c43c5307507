//! Role Classifier: assigns a role archetype from weighted signature-term counts.
//!
//! The archetype only biases keyword ranking and the hints handed to content
//! generation. It never changes the fixed 100-point category weights.

use serde::{Deserialize, Serialize};

use crate::analysis::taxonomy::{is_word_bounded, TermFlavor};

/// Closed set of role archetypes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleArchetype {
    SpecialistDba,
    CloudDataPlatformEngineer,
    DataEngineer,
    #[default]
    GenericDataRole,
}

impl RoleArchetype {
    /// Higher is more specific. Used to break score ties.
    fn specificity(self) -> u8 {
        match self {
            RoleArchetype::SpecialistDba => 3,
            RoleArchetype::CloudDataPlatformEngineer => 2,
            RoleArchetype::DataEngineer => 1,
            RoleArchetype::GenericDataRole => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoleArchetype::SpecialistDba => "specialist database administrator",
            RoleArchetype::CloudDataPlatformEngineer => "cloud data platform engineer",
            RoleArchetype::DataEngineer => "data engineer",
            RoleArchetype::GenericDataRole => "data professional",
        }
    }

    /// Ranking multiplier applied to a term of the given flavor.
    pub fn flavor_bias(self, flavor: TermFlavor) -> f64 {
        match (self, flavor) {
            (RoleArchetype::CloudDataPlatformEngineer, TermFlavor::Cloud) => 1.3,
            (RoleArchetype::CloudDataPlatformEngineer, TermFlavor::OnPrem) => 0.8,
            (RoleArchetype::DataEngineer, TermFlavor::Pipeline) => 1.3,
            (RoleArchetype::DataEngineer, TermFlavor::OnPrem) => 0.9,
            (RoleArchetype::SpecialistDba, TermFlavor::OnPrem) => 1.2,
            (RoleArchetype::SpecialistDba, TermFlavor::Pipeline) => 0.9,
            _ => 1.0,
        }
    }

    pub fn hints(self) -> WeightingHints {
        let (prefer, deprioritize): (&[&str], &[&str]) = match self {
            RoleArchetype::SpecialistDba => (
                &["engine internals", "high availability", "performance tuning", "on-prem operations"],
                &["pipeline orchestration"],
            ),
            RoleArchetype::CloudDataPlatformEngineer => (
                &["managed cloud databases", "infrastructure as code", "cloud migration"],
                &["legacy on-prem administration", "hardware-level clustering"],
            ),
            RoleArchetype::DataEngineer => (
                &["data pipelines", "transformation tooling", "orchestration", "data modeling"],
                &["day-to-day database administration"],
            ),
            RoleArchetype::GenericDataRole => (&[], &[]),
        };
        WeightingHints {
            prefer: prefer.iter().map(|s| s.to_string()).collect(),
            deprioritize: deprioritize.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Emphasis guidance passed to content generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightingHints {
    pub prefer: Vec<String>,
    pub deprioritize: Vec<String>,
}

/// Signature terms per archetype, with per-term weights.
const SIGNATURES: &[(RoleArchetype, &[(&str, u32)])] = &[
    (
        RoleArchetype::SpecialistDba,
        &[
            ("database administrator", 3),
            ("dba", 3),
            ("sql server", 2),
            ("always on", 2),
            ("availability groups", 2),
            ("failover", 1),
            ("backup", 1),
            ("performance tuning", 1),
            ("index", 1),
            ("t-sql", 1),
            ("patching", 1),
        ],
    ),
    (
        RoleArchetype::CloudDataPlatformEngineer,
        &[
            ("azure sql", 3),
            ("managed instance", 2),
            ("amazon rds", 2),
            ("aws", 1),
            ("azure", 1),
            ("gcp", 1),
            ("terraform", 2),
            ("infrastructure as code", 2),
            ("cloud migration", 2),
            ("platform engineer", 3),
            ("kubernetes", 1),
        ],
    ),
    (
        RoleArchetype::DataEngineer,
        &[
            ("data engineer", 3),
            ("dbt", 2),
            ("airflow", 2),
            ("etl", 1),
            ("elt", 1),
            ("data pipeline", 2),
            ("spark", 2),
            ("kafka", 1),
            ("snowflake", 1),
            ("data warehouse", 1),
            ("python", 1),
        ],
    ),
];

/// Occurrences in the title count this many times more than body occurrences.
const TITLE_MULTIPLIER: u32 = 3;

/// Per-archetype weighted signal counts, exposed for logging and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeScore {
    pub archetype: RoleArchetype,
    pub score: u32,
}

/// Classifies a job description. Highest weighted count wins; ties prefer the
/// more specific archetype; no signal at all falls back to the generic role.
pub fn classify(jd_text: &str, title: &str) -> RoleArchetype {
    let scores = archetype_scores(jd_text, title);
    scores
        .iter()
        .filter(|s| s.score > 0)
        .max_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then(a.archetype.specificity().cmp(&b.archetype.specificity()))
        })
        .map(|s| s.archetype)
        .unwrap_or_default()
}

pub fn archetype_scores(jd_text: &str, title: &str) -> Vec<ArchetypeScore> {
    let body = jd_text.to_lowercase();
    let title = title.to_lowercase();

    SIGNATURES
        .iter()
        .map(|(archetype, terms)| {
            let score = terms
                .iter()
                .map(|(term, weight)| {
                    let body_hits = count_phrase(&body, term);
                    let title_hits = count_phrase(&title, term);
                    weight * (body_hits + TITLE_MULTIPLIER * title_hits)
                })
                .sum();
            ArchetypeScore {
                archetype: *archetype,
                score,
            }
        })
        .collect()
}

fn count_phrase(haystack: &str, needle: &str) -> u32 {
    haystack
        .match_indices(needle)
        .filter(|(start, _)| is_word_bounded(haystack, *start, start + needle.len()))
        .count() as u32
}
