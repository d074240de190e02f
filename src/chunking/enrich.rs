//! Report metadata and the short-chunk filter.

use crate::error::{RapportsError, Result};
use crate::types::{keys, Chunk};
use serde::{Deserialize, Serialize};

/// Report-level descriptor attached to every chunk of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub institution: String,
    pub year: i64,
    pub title: String,
    pub theme: String,
    /// Stable identifier of the source file, used to detect re-ingestion
    pub source: String,
}

impl ReportInfo {
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(RapportsError::InvalidReport("empty source".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(RapportsError::InvalidReport(format!(
                "empty title for {}",
                self.source
            )));
        }
        if self.year <= 0 {
            return Err(RapportsError::InvalidReport(format!(
                "invalid year {} for {}",
                self.year, self.source
            )));
        }
        Ok(())
    }
}

/// Attach report metadata and final positions.
///
/// `section` and `section_index` are only filled in when absent, so chunks
/// from the recursive strategy end up with `""` and `-1`.
pub fn enrich(chunks: Vec<Chunk>, report: &ReportInfo) -> Vec<Chunk> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, mut chunk)| {
            chunk.set(keys::INSTITUTION, report.institution.trim());
            chunk.set(keys::YEAR, report.year);
            chunk.set(keys::TITLE, report.title.as_str());
            chunk.set(keys::THEME, report.theme.as_str());
            chunk.set(keys::SOURCE, report.source.as_str());
            chunk.set(keys::CHUNK_INDEX, i);
            chunk.set_default(keys::SECTION, "");
            chunk.set_default(keys::SECTION_INDEX, -1i64);
            chunk
        })
        .collect()
}

/// Drop chunks whose trimmed length is at or below `min_length` characters.
pub fn filter_short(mut chunks: Vec<Chunk>, min_length: usize) -> Vec<Chunk> {
    chunks.retain(|chunk| chunk.trimmed_len() > min_length);
    chunks
}

/// Summary of one report's chunks, for ingestion logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkStats {
    pub chunks: usize,
    /// Mean length in characters, rounded down
    pub average_length: usize,
    /// Chunks carrying a non-empty section title
    pub with_section: usize,
}

impl ChunkStats {
    pub fn of(chunks: &[Chunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }
        let total: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        Self {
            chunks: chunks.len(),
            average_length: total / chunks.len(),
            with_section: chunks.iter().filter(|c| !c.section().is_empty()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn report() -> ReportInfo {
        ReportInfo {
            institution: " IGF ".to_string(),
            year: 2023,
            title: "Les jetons numériques".to_string(),
            theme: "finances publiques".to_string(),
            source: "data/raw/jetons.pdf".to_string(),
        }
    }

    #[test]
    fn test_enrich_sets_report_fields_and_positions() {
        let mut sectioned = Chunk::new("premier", Metadata::new());
        sectioned.set(keys::SECTION, "INTRODUCTION");
        sectioned.set(keys::SECTION_INDEX, 0i64);
        let plain = Chunk::new("second", Metadata::new());

        let chunks = enrich(vec![sectioned, plain], &report());

        assert_eq!(chunks[0].section(), "INTRODUCTION");
        assert_eq!(chunks[0].section_index(), Some(0));
        assert_eq!(chunks[1].section(), "");
        assert_eq!(chunks[1].section_index(), Some(-1));
        assert_eq!(chunks[1].chunk_index(), Some(1));
        assert_eq!(chunks[1].get_str(keys::INSTITUTION), Some("IGF"));
        assert_eq!(chunks[1].get_str(keys::TITLE), Some("Les jetons numériques"));
        assert_eq!(chunks[1].get_int(keys::YEAR), Some(2023));
    }

    #[test]
    fn test_enrich_overwrites_document_source() {
        let mut chunk = Chunk::new("texte", Metadata::new());
        chunk.set(keys::SOURCE, "/tmp/extracted.txt");
        let chunks = enrich(vec![chunk], &report());
        assert_eq!(chunks[0].source(), Some("data/raw/jetons.pdf"));
    }

    #[test]
    fn test_filter_short_boundary() {
        let chunks = vec![
            Chunk::new(format!("  {}  ", "a".repeat(150)), Metadata::new()),
            Chunk::new("é".repeat(151), Metadata::new()),
            Chunk::new("", Metadata::new()),
        ];
        let kept = filter_short(chunks, 150);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].trimmed_len(), 151);
    }

    #[test]
    fn test_validate() {
        assert!(report().validate().is_ok());

        let mut r = report();
        r.title = String::new();
        assert!(matches!(r.validate(), Err(RapportsError::InvalidReport(_))));

        let mut r = report();
        r.year = -1;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_stats() {
        let mut a = Chunk::new("abcd", Metadata::new());
        a.set(keys::SECTION, "SYNTHÈSE");
        let b = Chunk::new("ab", Metadata::new());
        let stats = ChunkStats::of(&[a, b]);
        assert_eq!(
            stats,
            ChunkStats {
                chunks: 2,
                average_length: 3,
                with_section: 1
            }
        );
        assert_eq!(ChunkStats::of(&[]), ChunkStats::default());
    }
}
