//! rapports: structure-aware chunking and retrieval for French institutional
//! reports (Cour des comptes, IGF, inspections, parliament).
//!
//! The chunking core is synchronous and does no I/O. Loading, ingestion,
//! the index and the chat model sit around it.

pub mod catalogue;
pub mod chunking;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod progress;
pub mod prompts;
pub mod rag;
pub mod reports;
pub mod search;
pub mod types;

pub use catalogue::{Catalogue, CatalogueEntry};
pub use chunking::{
    enrich, filter_short, is_protected, ChunkStats, Chunker, FallbackChunker, HeadingRegistry,
    HeadingRules, Institution, ReportChunker, ReportInfo, RuleSet, SectionChunker,
};
pub use config::{ChunkingConfig, Config, CustomRuleSet, ProtectionPolicy, Strategy};
pub use error::{RapportsError, Result};
pub use index::{is_already_ingested, InMemoryIndex, VectorIndex};
pub use ingest::{CatalogueRun, IngestOutcome, Ingestor};
pub use llm::{ChatModel, Completion, Message, Role};
pub use loader::{ensure_exists, DocumentLoader, TextLoader};
pub use progress::IngestProgress;
pub use rag::{answer, AnswerMode, AnswerRequest};
pub use reports::{summarize_reports, ReportSummary};
pub use search::{SearchFilter, SearchResult};
pub use types::{Chunk, Document, MetaValue, Metadata};
