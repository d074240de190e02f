//! Chunking: turning a report's extracted text into retrievable chunks.
//!
//! Two strategies:
//! - `sections`: cut at headings recognized by the institution's rule set,
//!   splitting oversized sections into overlapping windows
//! - `recursive`: overlapping windows over the whole document
//!
//! Both are followed by the short-chunk filter and metadata enrichment.

pub mod detect;
pub mod enrich;
pub mod fallback;
pub mod patterns;
pub mod protect;
pub mod sections;

pub use detect::{detect_section_title, normalize_line};
pub use enrich::{enrich, filter_short, ChunkStats, ReportInfo};
pub use fallback::{FallbackChunker, Window};
pub use patterns::{HeadingLevel, HeadingRegistry, HeadingRules, Institution, RuleSet};
pub use protect::is_protected;
pub use sections::SectionChunker;

use crate::config::{ChunkingConfig, Config, CustomRuleSet, Strategy};
use crate::error::Result;
use crate::types::{Chunk, Document};
use tracing::{debug, warn};

/// Default window size, in characters
pub const TARGET_SIZE: usize = crate::config::CHUNK_SIZE;

/// Default overlap between windows, in characters
pub const OVERLAP: usize = crate::config::CHUNK_OVERLAP;

/// Default minimum trimmed length of a kept chunk
pub const MIN_CHUNK: usize = crate::config::MIN_CHUNK_LENGTH;

/// Anything that turns a document into an ordered list of chunks.
pub trait Chunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// The full chunking pipeline for one configuration.
///
/// Holds the compiled heading registry, so build it once and reuse it for
/// every report.
#[derive(Debug, Clone)]
pub struct ReportChunker {
    config: ChunkingConfig,
    registry: HeadingRegistry,
    splitter: FallbackChunker,
}

impl ReportChunker {
    /// Validate the sizes and compile every rule set, built-in and custom.
    pub fn new(config: ChunkingConfig, custom_rules: &[CustomRuleSet]) -> Result<Self> {
        let splitter = FallbackChunker::from_config(&config)?;
        let registry = HeadingRegistry::with_custom(custom_rules)?;
        Ok(Self {
            config,
            registry,
            splitter,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.chunking.clone(), &config.custom_rules)
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn registry(&self) -> &HeadingRegistry {
        &self.registry
    }

    /// Raw segmentation with the configured strategy, before filtering and
    /// enrichment.
    pub fn segment(&self, document: &Document, institution: &Institution) -> Vec<Chunk> {
        match self.config.strategy {
            Strategy::Sections => {
                let rules = self.registry.resolve(institution);
                SectionChunker::new(rules, self.splitter.clone(), self.config.protection)
                    .chunk(document)
            }
            Strategy::Recursive => self.splitter.chunk(document),
        }
    }

    /// Chunk one report: segment, drop short chunks, then attach report
    /// metadata and final positions.
    ///
    /// An empty result is not an error; it is logged so the caller can retry
    /// with the other strategy.
    pub fn chunk_report(&self, document: &Document, report: &ReportInfo) -> Result<Vec<Chunk>> {
        report.validate()?;

        let institution = Institution::parse(&report.institution);
        let segmented = self.segment(document, &institution);
        let segmented_count = segmented.len();

        let kept = filter_short(segmented, self.config.min_chunk_length);
        debug!(
            source = %report.source,
            strategy = self.config.strategy.name(),
            segmented = segmented_count,
            kept = kept.len(),
            "chunked report"
        );

        let chunks = enrich(kept, report);
        if chunks.is_empty() {
            warn!(
                source = %report.source,
                strategy = self.config.strategy.name(),
                "no chunk survived filtering"
            );
        }
        Ok(chunks)
    }
}
