//! Listing the reports held by an index.

use crate::types::{keys, Metadata};
use serde::Serialize;
use std::collections::BTreeMap;

/// One ingested report and its chunk count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub institution: String,
    /// `"?"` when a chunk has no year
    pub year: String,
    pub title: String,
    pub chunks: usize,
}

/// Group chunk metadata by (institution, year, title), sorted by that key.
pub fn summarize_reports(metadata: &[Metadata]) -> Vec<ReportSummary> {
    let mut counts: BTreeMap<(String, String, String), usize> = BTreeMap::new();
    for meta in metadata {
        let field = |key: &str| {
            meta.get(key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        let key = (field(keys::INSTITUTION), field(keys::YEAR), field(keys::TITLE));
        *counts.entry(key).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((institution, year, title), chunks)| ReportSummary {
            institution,
            year,
            title,
            chunks,
        })
        .collect()
}
