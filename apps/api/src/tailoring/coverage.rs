//! Coverage Reporter: which bucketed keywords the content mentions, and which it misses.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::keywords::KeywordBuckets;
use crate::analysis::taxonomy::Taxonomy;

/// `matched` and `missing` are disjoint and together equal the bucket union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub matched_keywords: BTreeSet<String>,
    pub missing_keywords: BTreeSet<String>,
}

impl CoverageReport {
    /// Matched share in whole percent. 0 when there are no keywords.
    pub fn percent(&self) -> u32 {
        let total = self.matched_keywords.len() + self.missing_keywords.len();
        if total == 0 {
            return 0;
        }
        ((self.matched_keywords.len() * 100) / total) as u32
    }
}

/// Pure set partition: a keyword (or synonym) present in `text` is matched.
pub fn report_coverage(text: &str, buckets: &KeywordBuckets, taxonomy: &Taxonomy) -> CoverageReport {
    let (matched_keywords, missing_keywords) = buckets
        .all_keywords()
        .into_iter()
        .partition(|keyword| taxonomy.mentions(text, keyword));
    CoverageReport {
        matched_keywords,
        missing_keywords,
    }
}
