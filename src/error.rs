//! Error types for the chunking core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the chunking core and its registry.
#[derive(Debug, Error)]
pub enum RapportsError {
    /// The source file does not exist (checked before any loading or segmentation).
    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The report descriptor or document cannot be chunked.
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// A heading rule failed to compile.
    #[error("invalid heading pattern for {rule_set}: {pattern:?}")]
    InvalidPattern {
        rule_set: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A custom rule set with no patterns.
    #[error("rule set for {0} has no patterns")]
    EmptyRuleSet(String),

    /// Window sizes that the splitter cannot honour.
    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),

    /// A retrieval request that cannot be answered as asked.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, RapportsError>;
