//! Document loading
//!
//! PDF text extraction runs outside this crate; loaders read its output.
//! A report `x.pdf` is read from the extracted `x.txt` next to it.

use crate::error::RapportsError;
use crate::types::{keys, Document};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Page separator emitted by PDF text extraction
pub const PAGE_BREAK: char = '\x0c';

/// Turns a file into a [`Document`].
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Document>;

    /// File extensions this loader accepts (lowercase, no dot)
    fn supported_extensions(&self) -> &[&str];
}

/// Fail with [`RapportsError::DocumentNotFound`] when `path` does not exist.
pub fn ensure_exists(path: &Path) -> std::result::Result<(), RapportsError> {
    if path.exists() {
        Ok(())
    } else {
        Err(RapportsError::DocumentNotFound(path.to_path_buf()))
    }
}

/// Loads pre-extracted UTF-8 text, one form feed between pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl TextLoader {
    pub fn new() -> Self {
        Self
    }

    /// Build a document from extracted text.
    pub fn from_text(text: &str, source: &str) -> Document {
        let page_count = text.trim_end_matches(PAGE_BREAK).split(PAGE_BREAK).count();
        Document::new(text.replace(PAGE_BREAK, "\n"))
            .with_meta(keys::SOURCE, source)
            .with_meta(keys::PAGE_COUNT, page_count)
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        ensure_exists(path)?;
        let text_path = path.with_extension("txt");
        if !text_path.exists() {
            bail!(
                "No extracted text for {} (expected {})",
                path.display(),
                text_path.display()
            );
        }
        let text = std::fs::read_to_string(&text_path)
            .with_context(|| format!("Failed to read {}", text_path.display()))?;
        Ok(Self::from_text(&text, &path.to_string_lossy()))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf", "txt"]
    }
}
