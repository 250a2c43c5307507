//! Truth ladder: how strongly the tailored résumé may claim each JD keyword.
//!
//! `HandsOn` and `Familiar` are evidence-gated against the candidate's own
//! résumé text. Everything else is `Omitted`, and an omitted keyword (or any
//! of its synonyms) must never appear in generated text, not even as a
//! case-insensitive substring.

use serde::{Deserialize, Serialize};

use crate::analysis::keywords::KeywordBuckets;
use crate::analysis::taxonomy::{Category, Taxonomy};
use crate::tailoring::models::ResumeBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruthLevel {
    /// The résumé mentions the keyword or a synonym.
    HandsOn,
    /// The résumé mentions related experience only.
    Familiar,
    Omitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthAssignment {
    pub keyword: String,
    pub category: Category,
    pub level: TruthLevel,
}

/// A keyword that must not appear, with every lowercase surface form to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedTerm {
    pub keyword: String,
    pub forms: Vec<String>,
}

/// Assigns a truth level to every bucketed keyword, in bucket order.
pub fn assign_truth_levels(
    resume_text: &str,
    buckets: &KeywordBuckets,
    taxonomy: &Taxonomy,
) -> Vec<TruthAssignment> {
    buckets
        .iter()
        .map(|(category, keyword)| {
            let level = if taxonomy.mentions(resume_text, keyword) {
                TruthLevel::HandsOn
            } else if taxonomy.mentions_related(resume_text, keyword) {
                TruthLevel::Familiar
            } else {
                TruthLevel::Omitted
            };
            TruthAssignment {
                keyword: keyword.to_string(),
                category,
                level,
            }
        })
        .collect()
}

/// Keywords at `level`, in assignment order.
pub fn keywords_at(assignments: &[TruthAssignment], level: TruthLevel) -> Vec<String> {
    assignments
        .iter()
        .filter(|a| a.level == level)
        .map(|a| a.keyword.clone())
        .collect()
}

pub fn banned_terms(assignments: &[TruthAssignment], taxonomy: &Taxonomy) -> Vec<BannedTerm> {
    assignments
        .iter()
        .filter(|a| a.level == TruthLevel::Omitted)
        .map(|a| {
            let mut forms: Vec<String> = taxonomy
                .surface_forms(&a.keyword)
                .into_iter()
                .map(|f| f.to_lowercase())
                .filter(|f| !f.is_empty())
                .collect();
            forms.dedup();
            BannedTerm {
                keyword: a.keyword.clone(),
                forms,
            }
        })
        .collect()
}

/// True if any banned form occurs anywhere in `text`, ignoring case.
pub fn contains_banned(text: &str, banned: &[BannedTerm]) -> bool {
    let lowered = text.to_lowercase();
    banned
        .iter()
        .any(|b| b.forms.iter().any(|f| lowered.contains(f.as_str())))
}

/// Omitted keywords found in any text field of the body. Plain substring
/// search, so "Snowflakes" still counts as "Snowflake".
pub fn find_violations(body: &ResumeBody, banned: &[BannedTerm]) -> Vec<String> {
    let fields: Vec<String> = body.text_fields().iter().map(|f| f.to_lowercase()).collect();
    banned
        .iter()
        .filter(|b| {
            b.forms
                .iter()
                .any(|form| fields.iter().any(|field| field.contains(form.as_str())))
        })
        .map(|b| b.keyword.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tailoring::models::ExperienceEntry;
    use crate::test_support::taxonomy;

    fn buckets() -> KeywordBuckets {
        KeywordBuckets {
            core_tech: vec!["Azure SQL Database".to_string(), "SQL Server".to_string()],
            tools: vec!["dbt".to_string(), "Airflow".to_string(), "PowerShell".to_string()],
            ..Default::default()
        }
    }

    fn level_of(assignments: &[TruthAssignment], keyword: &str) -> TruthLevel {
        assignments
            .iter()
            .find(|a| a.keyword == keyword)
            .map(|a| a.level)
            .unwrap()
    }

    #[test]
    fn test_truth_ladder_levels() {
        let resume = "Ran Microsoft SQL Server estates. Scheduled loads in Control-M.";
        let assignments = assign_truth_levels(resume, &buckets(), &taxonomy());

        assert_eq!(level_of(&assignments, "SQL Server"), TruthLevel::HandsOn);
        // Control-M is adjacent to Airflow.
        assert_eq!(level_of(&assignments, "Airflow"), TruthLevel::Familiar);
        assert_eq!(level_of(&assignments, "dbt"), TruthLevel::Omitted);
        // Related list of Azure SQL Database doesn't include on-prem SQL Server.
        assert_eq!(level_of(&assignments, "Azure SQL Database"), TruthLevel::Omitted);
        assert_eq!(assignments.len(), 5);
    }

    #[test]
    fn test_banned_terms_include_synonyms() {
        let t = taxonomy();
        let assignments = assign_truth_levels("", &buckets(), &t);
        let banned = banned_terms(&assignments, &t);
        let dbt = banned.iter().find(|b| b.keyword == "dbt").unwrap();
        assert!(dbt.forms.contains(&"data build tool".to_string()));
        assert!(dbt.forms.iter().all(|f| f == &f.to_lowercase()));
    }

    #[test]
    fn test_violations_are_case_insensitive_substrings() {
        let t = taxonomy();
        let assignments = assign_truth_levels("PowerShell", &buckets(), &t);
        let banned = banned_terms(&assignments, &t);

        let body = ResumeBody {
            summary: "Automation engineer using PowerShell.".to_string(),
            experience: vec![ExperienceEntry {
                title: "DBA".to_string(),
                company: "Contoso".to_string(),
                duration: "2019-2024".to_string(),
                achievements: vec!["Built DBT models for finance".to_string()],
            }],
            skills: vec!["apache airflow".to_string()],
        };
        let violations = find_violations(&body, &banned);
        assert_eq!(violations, vec!["dbt".to_string(), "Airflow".to_string()]);
    }

    #[test]
    fn test_clean_body_has_no_violations() {
        let t = taxonomy();
        let assignments = assign_truth_levels("PowerShell", &buckets(), &t);
        let banned = banned_terms(&assignments, &t);
        let body = ResumeBody {
            summary: "Automation engineer using PowerShell.".to_string(),
            ..Default::default()
        };
        assert!(find_violations(&body, &banned).is_empty());
        assert!(contains_banned("uses AIRFLOW", &banned));
        assert!(!contains_banned("uses PowerShell", &banned));
    }

    #[test]
    fn test_keywords_at_filters_by_level() {
        let resume = "PowerShell and Azure Data Factory.";
        let assignments = assign_truth_levels(resume, &buckets(), &taxonomy());
        assert_eq!(keywords_at(&assignments, TruthLevel::HandsOn), vec!["PowerShell"]);
        assert_eq!(
            keywords_at(&assignments, TruthLevel::Familiar),
            vec!["Azure SQL Database", "Airflow"]
        );
    }
}
