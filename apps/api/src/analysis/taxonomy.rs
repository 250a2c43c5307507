//! Domain term list: canonical keywords, their synonyms, and adjacency links.
//!
//! Every keyword the pipeline reasons about is canonicalized here first, so the
//! bucketizer, truth ladder, scorer, and coverage report all agree on what
//! "the same keyword" means.

use std::collections::HashMap;

use aho_corasick::{AhoCorasick, BuildError, MatchKind};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Categories
// ────────────────────────────────────────────────────────────────────────────

/// The six fixed keyword categories. Declaration order is the scoring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    CoreTech,
    Responsibilities,
    Tools,
    AdjacentDataStores,
    Compliance,
    Logistics,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::CoreTech,
        Category::Responsibilities,
        Category::Tools,
        Category::AdjacentDataStores,
        Category::Compliance,
        Category::Logistics,
    ];

    #[cfg(test)]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::CoreTech => "coreTech",
            Category::Responsibilities => "responsibilities",
            Category::Tools => "tools",
            Category::AdjacentDataStores => "adjacentDataStores",
            Category::Compliance => "compliance",
            Category::Logistics => "logistics",
        }
    }

    /// Curated bucket importance. CoreTech terms rank highest.
    pub fn importance(self) -> f64 {
        match self {
            Category::CoreTech => 1.0,
            Category::Responsibilities => 0.8,
            Category::Tools => 0.7,
            Category::AdjacentDataStores => 0.5,
            Category::Compliance => 0.5,
            Category::Logistics => 0.3,
        }
    }

    /// Per-bucket keyword cap. Caps sum to the 30-keyword budget.
    pub fn cap(self) -> usize {
        match self {
            Category::CoreTech => 10,
            Category::Responsibilities => 6,
            Category::Tools => 6,
            Category::AdjacentDataStores => 3,
            Category::Compliance => 3,
            Category::Logistics => 2,
        }
    }
}

/// Deployment flavor of a term. Role archetypes bias ranking by flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermFlavor {
    Cloud,
    OnPrem,
    Pipeline,
    Neutral,
}

// ────────────────────────────────────────────────────────────────────────────
// Term definitions
// ────────────────────────────────────────────────────────────────────────────

/// One canonical keyword with its many-to-one synonym list.
///
/// `related` names adjacent experience: a résumé mentioning one of these
/// supports a `familiar` claim for the keyword, never a `hands-on` one.
#[derive(Debug, Clone, Copy)]
pub struct TermDef {
    pub canonical: &'static str,
    pub category: Category,
    pub importance: f64,
    pub flavor: TermFlavor,
    pub aliases: &'static [&'static str],
    pub related: &'static [&'static str],
}

const fn term(
    canonical: &'static str,
    category: Category,
    importance: f64,
    flavor: TermFlavor,
    aliases: &'static [&'static str],
    related: &'static [&'static str],
) -> TermDef {
    TermDef {
        canonical,
        category,
        importance,
        flavor,
        aliases,
        related,
    }
}

impl TermDef {
    /// Canonical form followed by every alias.
    pub fn surface_forms(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.canonical).chain(self.aliases.iter().copied())
    }
}

use Category::*;
use TermFlavor::*;

/// Built-in term list, tuned for database administration and data platform roles.
///
/// Aliases avoid short tokens that commonly occur inside unrelated words, because
/// omitted keywords are banned from generated text by plain substring search.
pub const BUILTIN_TERMS: &[TermDef] = &[
    // Core technology
    term("SQL Server", CoreTech, 1.0, OnPrem,
        &["Microsoft SQL Server", "MSSQL", "MS SQL"],
        &["Azure SQL Database", "Azure SQL Managed Instance", "Sybase"]),
    term("Azure SQL Database", CoreTech, 1.0, Cloud,
        &["Azure SQL DB"],
        &["Azure SQL Managed Instance", "Azure Data Factory", "Cosmos DB"]),
    term("Azure SQL Managed Instance", CoreTech, 0.8, Cloud,
        &["SQL Managed Instance"],
        &["Azure SQL Database"]),
    term("Amazon RDS", CoreTech, 0.8, Cloud,
        &["AWS RDS", "Amazon Aurora"],
        &["DynamoDB"]),
    term("Snowflake", CoreTech, 0.8, Cloud,
        &[],
        &["Databricks", "BigQuery", "Redshift"]),
    term("T-SQL", CoreTech, 0.9, Neutral,
        &["Transact-SQL", "TSQL"],
        &["PL/SQL", "Stored Procedures"]),
    term("High Availability & Disaster Recovery", CoreTech, 1.0, Neutral,
        &["High Availability and Disaster Recovery", "HA/DR", "HADR", "High Availability", "Disaster Recovery"],
        &["Log Shipping", "Failover Clustering", "Always On Availability Groups", "Backup and Recovery"]),
    term("Always On Availability Groups", CoreTech, 0.9, OnPrem,
        &["AlwaysOn", "Always On", "Availability Groups"],
        &["Failover Clustering", "Database Mirroring"]),
    term("Failover Clustering", CoreTech, 0.7, OnPrem,
        &["Failover Cluster Instances", "Windows Server Failover Clustering", "WSFC"],
        &["Always On Availability Groups"]),
    term("Performance Tuning", CoreTech, 1.0, Neutral,
        &["Query Tuning", "Query Optimization", "Performance Optimization", "Query Performance"],
        &["Execution Plans", "Index Optimization", "Wait Statistics"]),
    term("Index Optimization", CoreTech, 0.8, Neutral,
        &["Index Tuning", "Indexing Strategy", "Index Maintenance"],
        &["Performance Tuning", "Execution Plans"]),
    term("Execution Plans", CoreTech, 0.6, Neutral,
        &["Query Plans", "Query Store"],
        &["Performance Tuning"]),
    term("Backup and Recovery", CoreTech, 0.9, Neutral,
        &["Backup & Recovery", "Backup and Restore", "Backups"],
        &["High Availability & Disaster Recovery", "Point-in-Time Restore"]),
    term("Replication", CoreTech, 0.7, OnPrem,
        &["Transactional Replication", "Merge Replication"],
        &["Log Shipping", "Change Data Capture"]),
    term("Log Shipping", CoreTech, 0.6, OnPrem,
        &[],
        &["Replication", "Backup and Recovery"]),
    term("Stored Procedures", CoreTech, 0.7, Neutral,
        &["Stored Procedure"],
        &["T-SQL", "Functions and Triggers"]),
    term("Database Migration", CoreTech, 0.8, Neutral,
        &["Data Migration", "Cloud Migration", "Database Migrations"],
        &["Database Upgrades", "SSIS"]),
    term("Data Modeling", CoreTech, 0.8, Pipeline,
        &["Data Modelling", "Dimensional Modeling", "Schema Design"],
        &["Database Design", "Star Schema"]),
    term("SSIS", CoreTech, 0.6, OnPrem,
        &["SQL Server Integration Services"],
        &["Azure Data Factory", "ETL Development"]),
    // Responsibilities
    term("Database Administration", Responsibilities, 1.0, Neutral,
        &["Database Administrator", "DBA"],
        &["Database Operations"]),
    term("Capacity Planning", Responsibilities, 0.8, Neutral,
        &["Capacity Management", "Storage Planning"],
        &["Monitoring and Alerting"]),
    term("Monitoring and Alerting", Responsibilities, 0.8, Neutral,
        &["Monitoring", "Alerting", "Observability"],
        &["SolarWinds DPA", "Redgate"]),
    term("Incident Response", Responsibilities, 0.8, Neutral,
        &["Incident Management", "Root Cause Analysis", "Troubleshooting"],
        &["Production Support"]),
    term("Automation", Responsibilities, 0.8, Neutral,
        &["Automated", "Automate"],
        &["PowerShell", "Python", "Scripting"]),
    term("Patch Management", Responsibilities, 0.6, OnPrem,
        &["Patching", "Cumulative Updates"],
        &["Database Upgrades"]),
    term("Change Management", Responsibilities, 0.6, Neutral,
        &["Change Control"],
        &["Release Management"]),
    term("Documentation", Responsibilities, 0.5, Neutral,
        &["Runbooks", "Documented"],
        &["Knowledge Base"]),
    term("Mentoring", Responsibilities, 0.5, Neutral,
        &["Mentored", "Mentor", "Coaching"],
        &["Training", "Onboarding"]),
    term("Cross-Functional Collaboration", Responsibilities, 0.5, Neutral,
        &["Cross-Functional", "Stakeholder Management"],
        &["Partnered with"]),
    term("ETL Development", Responsibilities, 0.8, Pipeline,
        &["Data Pipelines", "Data Pipeline", "ETL"],
        &["SSIS", "Azure Data Factory", "Airflow"]),
    term("Database Design", Responsibilities, 0.7, Neutral,
        &["Database Architecture"],
        &["Data Modeling", "Schema Design"]),
    // Tools
    term("dbt", Tools, 0.9, Pipeline,
        &["data build tool", "dbt Core", "dbt Cloud"],
        &["SQL-based transformations"]),
    term("Airflow", Tools, 0.9, Pipeline,
        &["Apache Airflow"],
        &["Azure Data Factory", "SQL Server Agent", "Control-M"]),
    term("Azure Data Factory", Tools, 0.8, Cloud,
        &["ADF"],
        &["SSIS", "Airflow"]),
    term("Terraform", Tools, 0.7, Cloud,
        &[],
        &["ARM Templates", "Bicep", "CloudFormation"]),
    term("PowerShell", Tools, 0.8, Neutral,
        &["dbatools"],
        &["Bash", "Python"]),
    term("Python", Tools, 0.7, Pipeline,
        &[],
        &["PowerShell", "Bash"]),
    term("Azure DevOps", Tools, 0.6, Cloud,
        &["Azure Pipelines"],
        &["GitHub Actions", "Jenkins"]),
    term("GitHub Actions", Tools, 0.5, Neutral,
        &[],
        &["Azure DevOps", "Jenkins"]),
    term("Redgate", Tools, 0.5, Neutral,
        &["Redgate SQL Monitor", "SQL Monitor"],
        &["SolarWinds DPA"]),
    term("SolarWinds DPA", Tools, 0.5, Neutral,
        &["Database Performance Analyzer", "SolarWinds"],
        &["Redgate"]),
    term("Kubernetes", Tools, 0.5, Cloud,
        &["K8s"],
        &["Docker"]),
    term("Docker", Tools, 0.5, Neutral,
        &[],
        &["Kubernetes", "Containers"]),
    term("Spark", Tools, 0.7, Pipeline,
        &["Apache Spark", "PySpark"],
        &["Databricks"]),
    term("Kafka", Tools, 0.6, Pipeline,
        &["Apache Kafka"],
        &["Event Hubs", "Change Data Capture"]),
    term("Jira", Tools, 0.3, Neutral,
        &[],
        &["ServiceNow"]),
    // Adjacent data stores
    term("PostgreSQL", AdjacentDataStores, 0.8, Neutral,
        &["Postgres"],
        &["MySQL"]),
    term("MySQL", AdjacentDataStores, 0.7, Neutral,
        &["MariaDB"],
        &["PostgreSQL"]),
    term("Oracle Database", AdjacentDataStores, 0.7, OnPrem,
        &["Oracle"],
        &["PL/SQL"]),
    term("MongoDB", AdjacentDataStores, 0.6, Neutral,
        &["Mongo"],
        &["Cosmos DB"]),
    term("Cosmos DB", AdjacentDataStores, 0.6, Cloud,
        &["Azure Cosmos DB", "CosmosDB"],
        &["MongoDB"]),
    term("Redis", AdjacentDataStores, 0.5, Neutral,
        &[],
        &["Memcached"]),
    term("Elasticsearch", AdjacentDataStores, 0.5, Neutral,
        &["OpenSearch"],
        &[]),
    term("Cassandra", AdjacentDataStores, 0.4, Neutral,
        &[],
        &["DynamoDB"]),
    term("DynamoDB", AdjacentDataStores, 0.5, Cloud,
        &[],
        &["Cassandra"]),
    // Compliance
    term("SOX", Compliance, 0.8, Neutral,
        &["Sarbanes-Oxley"],
        &["Auditing"]),
    term("HIPAA", Compliance, 0.8, Neutral,
        &[],
        &["PHI"]),
    term("GDPR", Compliance, 0.7, Neutral,
        &[],
        &["Data Privacy"]),
    term("PCI DSS", Compliance, 0.7, Neutral,
        &["PCI-DSS"],
        &["Cardholder Data"]),
    term("SOC 2", Compliance, 0.7, Neutral,
        &["SOC2", "SOC II"],
        &["Auditing"]),
    term("Data Encryption", Compliance, 0.7, Neutral,
        &["Transparent Data Encryption", "Always Encrypted", "Encryption"],
        &["Key Management"]),
    term("Auditing", Compliance, 0.6, Neutral,
        &["Audits", "Audit"],
        &["SOX", "SOC 2"]),
    term("Access Control", Compliance, 0.6, Neutral,
        &["Role-Based Access Control", "RBAC", "Least Privilege"],
        &["Active Directory"]),
    term("Data Governance", Compliance, 0.6, Neutral,
        &["Data Stewardship"],
        &["Data Catalog"]),
    // Logistics
    term("Remote", Logistics, 0.6, Neutral,
        &["Fully Remote", "Remote-First", "Work from Home"],
        &[]),
    term("Hybrid", Logistics, 0.5, Neutral,
        &["Hybrid Schedule"],
        &[]),
    term("On-Site", Logistics, 0.5, Neutral,
        &["Onsite", "In-Office"],
        &[]),
    term("On-Call Rotation", Logistics, 0.7, Neutral,
        &["On-Call", "On Call", "24/7 Support"],
        &["Production Support"]),
    term("Security Clearance", Logistics, 0.6, Neutral,
        &["Public Trust"],
        &[]),
    term("Travel", Logistics, 0.3, Neutral,
        &["Travel Required"],
        &[]),
];

// ────────────────────────────────────────────────────────────────────────────
// Taxonomy + matcher
// ────────────────────────────────────────────────────────────────────────────

/// A single term occurrence found in scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermHit {
    /// Index into `Taxonomy::terms()`.
    pub term: usize,
    /// Byte offset of the occurrence in the scanned text.
    pub start: usize,
}

/// Compiled term list: leftmost-longest scanner plus a synonym lookup table.
pub struct Taxonomy {
    terms: Vec<TermDef>,
    matcher: AhoCorasick,
    pattern_terms: Vec<usize>,
    by_surface: HashMap<String, usize>,
}

impl Taxonomy {
    pub fn builtin() -> Result<Self, BuildError> {
        Self::from_terms(BUILTIN_TERMS.to_vec())
    }

    pub fn from_terms(terms: Vec<TermDef>) -> Result<Self, BuildError> {
        let mut patterns = Vec::new();
        let mut pattern_terms = Vec::new();
        let mut by_surface = HashMap::new();

        for (idx, def) in terms.iter().enumerate() {
            for form in def.surface_forms() {
                patterns.push(form);
                pattern_terms.push(idx);
                // First definition wins if two terms ever share a surface form.
                by_surface.entry(form.to_lowercase()).or_insert(idx);
            }
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)?;

        Ok(Self {
            terms,
            matcher,
            pattern_terms,
            by_surface,
        })
    }

    pub fn terms(&self) -> &[TermDef] {
        &self.terms
    }

    pub fn term(&self, idx: usize) -> &TermDef {
        &self.terms[idx]
    }

    /// Resolves a keyword or any of its synonyms to its term definition.
    pub fn lookup(&self, keyword: &str) -> Option<&TermDef> {
        self.by_surface
            .get(&keyword.trim().to_lowercase())
            .map(|&idx| &self.terms[idx])
    }

    /// Canonical form of a keyword; unknown keywords are returned trimmed.
    pub fn canonicalize(&self, keyword: &str) -> String {
        self.lookup(keyword)
            .map(|t| t.canonical.to_string())
            .unwrap_or_else(|| keyword.trim().to_string())
    }

    /// Every surface form that counts as the keyword: canonical plus aliases.
    pub fn surface_forms(&self, keyword: &str) -> Vec<String> {
        match self.lookup(keyword) {
            Some(def) => def.surface_forms().map(str::to_string).collect(),
            None => vec![keyword.trim().to_string()],
        }
    }

    /// Scans text for term occurrences (leftmost-longest, word-boundary aware).
    pub fn scan(&self, text: &str) -> Vec<TermHit> {
        self.matcher
            .find_iter(text)
            .filter(|m| is_word_bounded(text, m.start(), m.end()))
            .map(|m| TermHit {
                term: self.pattern_terms[m.pattern().as_usize()],
                start: m.start(),
            })
            .collect()
    }

    /// True if the text mentions the keyword or one of its synonyms.
    pub fn mentions(&self, text: &str, keyword: &str) -> bool {
        let haystack = text.to_lowercase();
        self.surface_forms(keyword)
            .iter()
            .any(|form| contains_phrase(&haystack, &form.to_lowercase()))
    }

    /// True if the text mentions adjacent (related, not identical) experience.
    pub fn mentions_related(&self, text: &str, keyword: &str) -> bool {
        let Some(def) = self.lookup(keyword) else {
            return false;
        };
        let haystack = text.to_lowercase();
        def.related.iter().any(|related| {
            self.surface_forms(related)
                .iter()
                .any(|form| contains_phrase(&haystack, &form.to_lowercase()))
        })
    }
}

/// Case-sensitive phrase search with word boundaries. Callers lowercase both sides.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack
        .match_indices(needle)
        .any(|(start, _)| is_word_bounded(haystack, start, start + needle.len()))
}

/// True if `text[start..end]` is not glued to alphanumerics on either side.
pub fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric());
    let after_ok = text[end..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric());
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy::builtin().unwrap()
    }

    #[test]
    fn test_bucket_caps_sum_to_budget() {
        let total: usize = Category::ALL.iter().map(|c| c.cap()).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn test_category_serializes_camel_case() {
        let json = serde_json::to_string(&Category::AdjacentDataStores).unwrap();
        assert_eq!(json, r#""adjacentDataStores""#);
        assert_eq!(Category::CoreTech.as_str(), "coreTech");
    }

    #[test]
    fn test_synonyms_canonicalize_to_one_form() {
        let t = taxonomy();
        assert_eq!(t.canonicalize("AlwaysOn"), "Always On Availability Groups");
        assert_eq!(t.canonicalize("availability groups"), "Always On Availability Groups");
        assert_eq!(t.canonicalize("HA/DR"), "High Availability & Disaster Recovery");
        assert_eq!(t.canonicalize("  Unknown Thing "), "Unknown Thing");
    }

    #[test]
    fn test_no_surface_form_is_shared_between_terms() {
        let mut seen = HashMap::new();
        for def in BUILTIN_TERMS {
            for form in def.surface_forms() {
                let previous = seen.insert(form.to_lowercase(), def.canonical);
                assert!(
                    previous.is_none(),
                    "'{form}' belongs to both {previous:?} and {}",
                    def.canonical
                );
            }
        }
    }

    #[test]
    fn test_scan_prefers_longest_match() {
        let t = taxonomy();
        let hits = t.scan("Experience with AlwaysOn and Always On Availability Groups required.");
        let names: Vec<_> = hits.iter().map(|h| t.term(h.term).canonical).collect();
        assert_eq!(
            names,
            vec!["Always On Availability Groups", "Always On Availability Groups"]
        );
    }

    #[test]
    fn test_scan_respects_word_boundaries() {
        let t = taxonomy();
        // "dbt" inside "sdbtool" and "Redis" inside "Redistribute" must not match.
        let hits = t.scan("Use sdbtool to Redistribute load");
        assert!(hits.is_empty(), "unexpected hits: {hits:?}");
    }

    #[test]
    fn test_mentions_matches_synonyms() {
        let t = taxonomy();
        let resume = "Led disaster recovery planning for 40 production databases.";
        assert!(t.mentions(resume, "High Availability & Disaster Recovery"));
        assert!(!t.mentions(resume, "Azure SQL Database"));
    }

    #[test]
    fn test_mentions_related_is_adjacent_only() {
        let t = taxonomy();
        let resume = "Built pipelines in Azure Data Factory.";
        assert!(t.mentions_related(resume, "Airflow"));
        assert!(!t.mentions(resume, "Airflow"));
    }

    #[test]
    fn test_on_prem_sql_server_is_not_evidence_for_azure_sql() {
        let t = taxonomy();
        let resume = "Administered on-prem SQL Server 2016 clusters.";
        assert!(!t.mentions(resume, "Azure SQL Database"));
        assert!(!t.mentions_related(resume, "Azure SQL Database"));
    }

    #[test]
    fn test_contains_phrase_boundaries() {
        assert!(contains_phrase("uses t-sql daily", "t-sql"));
        assert!(!contains_phrase("digital", "git"));
        assert!(!contains_phrase("anything", ""));
    }
}
