//! Core data types: documents, chunks and their metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata keys shared by documents and chunks.
pub mod keys {
    pub const SECTION: &str = "section";
    pub const SECTION_INDEX: &str = "section_index";
    pub const INSTITUTION: &str = "institution";
    pub const YEAR: &str = "year";
    pub const TITLE: &str = "title";
    pub const THEME: &str = "theme";
    pub const SOURCE: &str = "source";
    pub const CHUNK_INDEX: &str = "chunk_index";
    pub const START_INDEX: &str = "start_index";
    pub const PAGE: &str = "page";
    pub const PAGE_COUNT: &str = "page_count";
}

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for MetaValue {
    fn from(n: u32) -> Self {
        Self::Int(n as i64)
    }
}

impl From<usize> for MetaValue {
    fn from(n: usize) -> Self {
        Self::Int(n as i64)
    }
}

/// Ordered key-value metadata. Ordering keeps serialized output stable.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Extracted text of one report plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// True when the text has no non-whitespace character.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A retrievable span of a document with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetaValue::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.metadata.get(key).and_then(MetaValue::as_int)
    }

    /// Insert or overwrite a metadata value.
    pub fn set(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Insert a metadata value only when the key is absent.
    pub fn set_default(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.metadata
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    /// Section title, `""` when the chunk has none.
    pub fn section(&self) -> &str {
        self.get_str(keys::SECTION).unwrap_or("")
    }

    pub fn section_index(&self) -> Option<i64> {
        self.get_int(keys::SECTION_INDEX)
    }

    pub fn chunk_index(&self) -> Option<i64> {
        self.get_int(keys::CHUNK_INDEX)
    }

    pub fn start_index(&self) -> Option<i64> {
        self.get_int(keys::START_INDEX)
    }

    pub fn source(&self) -> Option<&str> {
        self.get_str(keys::SOURCE)
    }

    /// Length in characters of the trimmed text.
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}
