//! Grouping of crawl records by canonical URL.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};
use urlgraph_canon::Canonicalizer;

use crate::model::UrlRecord;

/// Partitions records into equivalence classes keyed by canonical URL.
pub struct CanonicalIndex {
    canonicalizer: Canonicalizer,
}

impl CanonicalIndex {
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self { canonicalizer }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Every record lands in exactly one class. Canonical keys are computed
    /// in parallel; grouping keeps the input order inside each class.
    pub fn partition(&self, records: Vec<UrlRecord>) -> CanonicalPartition {
        let total = records.len();
        let keyed: Vec<(String, UrlRecord)> = records
            .into_par_iter()
            .map(|record| (self.canonicalizer.canonicalize(&record.url), record))
            .collect();

        let mut groups: BTreeMap<String, Vec<UrlRecord>> = BTreeMap::new();
        for (canonical, record) in keyed {
            groups.entry(canonical).or_default().push(record);
        }

        let mut unique = BTreeMap::new();
        let mut duplicates = BTreeMap::new();
        for (canonical, mut members) in groups {
            if members.len() == 1 {
                if let Some(record) = members.pop() {
                    unique.insert(canonical, record);
                }
            } else {
                debug!("{} records share canonical URL {}", members.len(), canonical);
                duplicates.insert(canonical, members);
            }
        }

        info!(
            "Partitioned {} records into {} canonical URLs ({} with duplicates)",
            total,
            unique.len() + duplicates.len(),
            duplicates.len()
        );

        CanonicalPartition {
            total_records: total,
            unique,
            duplicates,
        }
    }
}

/// The result of [`CanonicalIndex::partition`].
///
/// A canonical URL appears in `unique` or in `duplicates`, never both, and
/// every duplicate class holds at least two records.
#[derive(Debug, Clone)]
pub struct CanonicalPartition {
    total_records: usize,
    pub unique: BTreeMap<String, UrlRecord>,
    pub duplicates: BTreeMap<String, Vec<UrlRecord>>,
}

impl CanonicalPartition {
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn canonical_count(&self) -> usize {
        self.unique.len() + self.duplicates.len()
    }

    /// Records that would be dropped by keeping one per class.
    pub fn deduplication_savings(&self) -> usize {
        self.duplicates.values().map(|members| members.len() - 1).sum()
    }

    pub fn members(&self, canonical: &str) -> Vec<&UrlRecord> {
        if let Some(record) = self.unique.get(canonical) {
            return vec![record];
        }
        self.duplicates
            .get(canonical)
            .map(|members| members.iter().collect())
            .unwrap_or_default()
    }

    /// The first record of every class, in canonical URL order.
    pub fn representatives(&self) -> Vec<&UrlRecord> {
        let mut reps: Vec<(&String, &UrlRecord)> = self.unique.iter().collect();
        reps.extend(
            self.duplicates
                .iter()
                .filter_map(|(canonical, members)| members.first().map(|r| (canonical, r))),
        );
        reps.sort_by(|a, b| a.0.cmp(b.0));
        reps.into_iter().map(|(_, record)| record).collect()
    }

    /// Duplicate classes, largest first.
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .duplicates
            .iter()
            .map(|(canonical, members)| DuplicateGroup {
                canonical_url: canonical.clone(),
                count: members.len(),
                member_urls: members.iter().map(|r| r.url.clone()).collect(),
            })
            .collect();
        groups.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.canonical_url.cmp(&b.canonical_url))
        });
        groups
    }

    pub fn summary(&self) -> DedupSummary {
        let canonical = self.canonical_count();
        DedupSummary {
            total_original_urls: self.total_records,
            total_canonical_urls: canonical,
            unique_urls: self.unique.len(),
            duplicate_groups: self.duplicates.len(),
            total_duplicates: self.duplicates.values().map(Vec::len).sum(),
            deduplication_savings: self.deduplication_savings(),
        }
    }

    pub fn report(&self) -> PartitionReport {
        PartitionReport {
            summary: self.summary(),
            unique_count: self.unique.len(),
            duplicate_groups: self.duplicate_groups(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub canonical_url: String,
    pub count: usize,
    pub member_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupSummary {
    pub total_original_urls: usize,
    pub total_canonical_urls: usize,
    pub unique_urls: usize,
    pub duplicate_groups: usize,
    /// Records that belong to a duplicate class, counting every member.
    pub total_duplicates: usize,
    pub deduplication_savings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionReport {
    pub summary: DedupSummary,
    pub unique_count: usize,
    pub duplicate_groups: Vec<DuplicateGroup>,
}
