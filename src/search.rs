//! Metadata filters and keyword scoring for retrieval.

use crate::chunking::protect::fold_title;
use crate::chunking::Institution;
use crate::types::{keys, Chunk, MetaValue, Metadata};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Restricts a search to chunks matching every set field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub institution: Option<String>,
    pub year: Option<i64>,
    pub theme: Option<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    pub fn year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.institution.is_none() && self.year.is_none() && self.theme.is_none()
    }

    /// Active conditions as (metadata key, expected value), combined with AND.
    pub fn conditions(&self) -> Vec<(&'static str, MetaValue)> {
        let mut conditions = Vec::new();
        if let Some(institution) = &self.institution {
            conditions.push((keys::INSTITUTION, MetaValue::from(institution.trim())));
        }
        if let Some(year) = self.year {
            conditions.push((keys::YEAR, MetaValue::Int(year)));
        }
        if let Some(theme) = &self.theme {
            conditions.push((keys::THEME, MetaValue::from(theme.trim())));
        }
        conditions
    }

    /// Institutions compare by their normalized name, so "igf" matches "IGF".
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions().iter().all(|(key, expected)| {
            let actual = match metadata.get(*key) {
                Some(value) => value,
                None => return false,
            };
            if *key == keys::INSTITUTION {
                match (actual.as_str(), expected.as_str()) {
                    (Some(a), Some(e)) => Institution::parse(a) == Institution::parse(e),
                    _ => false,
                }
            } else {
                actual == expected
            }
        })
    }
}

/// A chunk returned by a search, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub chunk: Chunk,
    pub score: f32,
}

/// Lowercased, accent-free query terms of three letters or more.
/// Each term appears once, in query order.
pub fn query_terms(query: &str) -> Vec<String> {
    let folded = fold_title(query);
    let mut seen = HashSet::new();
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3 && seen.insert(*t))
        .map(str::to_string)
        .collect()
}

/// Share of query terms found in `text`, in [0, 1].
pub fn keyword_score(terms: &[String], text: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let folded = fold_title(text);
    let hits = terms.iter().filter(|t| folded.contains(t.as_str())).count();
    hits as f32 / terms.len() as f32
}

/// Add a small boost per query term found in the chunk text (capped at 0.2),
/// then sort by descending score. Ties keep their input order.
pub fn rerank_with_keywords(mut results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
    let terms = query_terms(query);
    for result in &mut results {
        let folded = fold_title(&result.chunk.text);
        let hits = terms.iter().filter(|t| folded.contains(t.as_str())).count();
        result.score += (hits as f32 * 0.05).min(0.2);
    }
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(id: &str, content: &str, score: f32) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            chunk: Chunk::new(content, Metadata::new()),
            score,
        }
    }

    fn metadata(institution: &str, year: i64, theme: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert(keys::INSTITUTION.to_string(), institution.into());
        m.insert(keys::YEAR.to_string(), year.into());
        m.insert(keys::THEME.to_string(), theme.into());
        m
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = SearchFilter::new();
        assert!(filter.is_empty());
        assert!(filter.conditions().is_empty());
        assert!(filter.matches(&Metadata::new()));
    }

    #[test]
    fn test_conditions_combine_with_and() {
        let filter = SearchFilter::new().institution("IGF").year(2023);
        assert_eq!(filter.conditions().len(), 2);
        assert!(filter.matches(&metadata("IGF", 2023, "santé")));
        assert!(!filter.matches(&metadata("IGF", 2022, "santé")));
        assert!(!filter.matches(&metadata("Cour des comptes", 2023, "santé")));
    }

    #[test]
    fn test_institution_compared_by_normalized_name() {
        let filter = SearchFilter::new().institution(" cour des Comptes");
        assert!(filter.matches(&metadata("Cour des comptes", 2020, "justice")));
    }

    #[test]
    fn test_missing_key_fails_condition() {
        let filter = SearchFilter::new().theme("logement");
        let mut m = Metadata::new();
        m.insert(keys::YEAR.to_string(), 2021i64.into());
        assert!(!filter.matches(&m));
    }

    #[test]
    fn test_query_terms_fold_accents_and_skip_short_words() {
        assert_eq!(
            query_terms("Quelles sont les dépenses de la Sécurité sociale ?"),
            vec!["quelles", "sont", "les", "depenses", "securite", "sociale"]
        );
    }

    #[test]
    fn test_repeated_query_word_counts_once() {
        let terms = query_terms("dépenses fiscales et dépenses sociales");
        assert_eq!(terms, vec!["depenses", "fiscales", "sociales"]);
        let score = keyword_score(&terms, "Les dépenses augmentent");
        assert!((score - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_keyword_score() {
        let terms = query_terms("dépenses fiscales");
        assert_eq!(keyword_score(&terms, "Les DEPENSES fiscales augmentent"), 1.0);
        assert_eq!(keyword_score(&terms, "Les dépenses sociales"), 0.5);
        assert_eq!(keyword_score(&[], "texte"), 0.0);
    }

    #[test]
    fn test_rerank_empty() {
        assert!(rerank_with_keywords(vec![], "query").is_empty());
    }

    #[test]
    fn test_rerank_multiple_terms() {
        let results = vec![
            make_result("1", "rapport", 0.5),
            make_result("2", "rapport sur la fiscalité locale", 0.5),
        ];
        let reranked = rerank_with_keywords(results, "rapport fiscalité");
        assert_eq!(reranked[0].id, "2");
    }

    #[test]
    fn test_rerank_boost_is_capped() {
        let results = vec![
            make_result("1", "alpha beta gamma delta epsilon zeta", 0.0),
            make_result("2", "texte", 0.25),
        ];
        let reranked = rerank_with_keywords(results, "alpha beta gamma delta epsilon zeta");
        assert_eq!(reranked[0].id, "2");
        assert!((reranked[1].score - 0.2).abs() < 1e-6);
    }
}
