//! Keyword Bucketizer: extracts, canonicalizes, ranks and buckets the top JD keywords.
//!
//! Pure and deterministic: the same text and archetype always produce the same
//! buckets. No LLM call.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::analysis::role_classifier::RoleArchetype;
use crate::analysis::taxonomy::{Category, Taxonomy};

/// Hard budget across all buckets.
pub const MAX_KEYWORDS: usize = 30;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Six fixed categories → keywords in relevance order (highest first).
///
/// A keyword appears in at most one bucket, always in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordBuckets {
    pub core_tech: Vec<String>,
    pub responsibilities: Vec<String>,
    pub tools: Vec<String>,
    pub adjacent_data_stores: Vec<String>,
    pub compliance: Vec<String>,
    pub logistics: Vec<String>,
}

impl KeywordBuckets {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::CoreTech => &self.core_tech,
            Category::Responsibilities => &self.responsibilities,
            Category::Tools => &self.tools,
            Category::AdjacentDataStores => &self.adjacent_data_stores,
            Category::Compliance => &self.compliance,
            Category::Logistics => &self.logistics,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::CoreTech => &mut self.core_tech,
            Category::Responsibilities => &mut self.responsibilities,
            Category::Tools => &mut self.tools,
            Category::AdjacentDataStores => &mut self.adjacent_data_stores,
            Category::Compliance => &mut self.compliance,
            Category::Logistics => &mut self.logistics,
        }
    }

    /// Every (category, keyword) pair in category order, then relevance order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> + '_ {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.get(c).iter().map(move |k| (c, k.as_str())))
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn all_keywords(&self) -> BTreeSet<String> {
        self.iter().map(|(_, k)| k.to_string()).collect()
    }

    pub fn category_of(&self, keyword: &str) -> Option<Category> {
        self.iter()
            .find(|(_, k)| k.eq_ignore_ascii_case(keyword))
            .map(|(c, _)| c)
    }
}

/// A ranked candidate keyword, before truncation. Exposed for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedKeyword {
    pub keyword: String,
    pub category: Category,
    pub frequency: u32,
    /// Byte offset of the first occurrence in the JD.
    pub first_position: usize,
    pub score: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Ranking + bucketing
// ────────────────────────────────────────────────────────────────────────────

/// Ranks every domain term found in the JD.
///
/// score = frequency × bucket importance × term importance × archetype bias.
/// Equal scores keep JD order (earlier first occurrence wins).
pub fn rank_keywords(
    jd_text: &str,
    archetype: RoleArchetype,
    taxonomy: &Taxonomy,
) -> Vec<RankedKeyword> {
    let mut tally: HashMap<usize, (u32, usize)> = HashMap::new();
    for hit in taxonomy.scan(jd_text) {
        let entry = tally.entry(hit.term).or_insert((0, hit.start));
        entry.0 += 1;
        entry.1 = entry.1.min(hit.start);
    }

    let mut ranked: Vec<RankedKeyword> = tally
        .into_iter()
        .map(|(idx, (frequency, first_position))| {
            let def = taxonomy.term(idx);
            let score = f64::from(frequency)
                * def.category.importance()
                * def.importance
                * archetype.flavor_bias(def.flavor);
            RankedKeyword {
                keyword: def.canonical.to_string(),
                category: def.category,
                frequency,
                first_position,
                score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.first_position.cmp(&b.first_position))
            .then(a.keyword.cmp(&b.keyword))
    });
    ranked
}

/// Extracts at most `MAX_KEYWORDS` keywords, partitioned into the fixed buckets.
pub fn bucketize(jd_text: &str, archetype: RoleArchetype, taxonomy: &Taxonomy) -> KeywordBuckets {
    let mut buckets = KeywordBuckets::default();
    for candidate in rank_keywords(jd_text, archetype, taxonomy) {
        if buckets.total() >= MAX_KEYWORDS {
            break;
        }
        let bucket = buckets.get_mut(candidate.category);
        if bucket.len() < candidate.category.cap() {
            bucket.push(candidate.keyword);
        }
    }
    buckets
}
