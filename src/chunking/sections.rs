//! Section Chunker
//!
//! Walks a document line by line, cuts it at detected headings and emits one
//! chunk per section. Sections longer than twice the window size go through
//! the fallback chunker, unless they are protected and the policy keeps them
//! whole.

use super::detect::{detect_section_title, normalize_line};
use super::fallback::FallbackChunker;
use super::patterns::HeadingRules;
use super::protect::is_protected;
use super::Chunker;
use crate::config::ProtectionPolicy;
use crate::types::{keys, Chunk, Document};
use tracing::debug;

/// Heading-aware chunker for one rule set
pub struct SectionChunker<'r> {
    rules: &'r HeadingRules,
    splitter: FallbackChunker,
    protection: ProtectionPolicy,
}

/// Text accumulated since the last heading.
struct SectionBuffer {
    text: String,
    title: Option<String>,
    index: i64,
}

impl SectionBuffer {
    fn new() -> Self {
        Self {
            text: String::new(),
            title: None,
            index: 0,
        }
    }

    fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    fn push_line(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
    }

    /// Start the next section with its heading line.
    fn restart(&mut self, line: &str, title: String) {
        self.text.clear();
        self.text.push_str(line);
        self.title = Some(title);
    }
}

impl<'r> SectionChunker<'r> {
    pub fn new(rules: &'r HeadingRules, splitter: FallbackChunker, protection: ProtectionPolicy) -> Self {
        Self {
            rules,
            splitter,
            protection,
        }
    }

    pub fn rules(&self) -> &HeadingRules {
        self.rules
    }

    /// Split a document into section chunks, in document order.
    ///
    /// Every chunk carries the document metadata plus `section` and
    /// `section_index`; sub-chunks of a split section also get `start_index`.
    pub fn segment(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut buffer = SectionBuffer::new();

        for line in document.text.split('\n') {
            let normalized = normalize_line(line);
            match detect_section_title(&normalized, self.rules) {
                Some(title) if buffer.has_content() => {
                    self.flush(&buffer, document, &mut chunks);
                    buffer.index += 1;
                    buffer.restart(line, title);
                }
                // Nothing accumulated yet: the heading names the current section
                Some(title) => buffer.restart(line, title),
                None => buffer.push_line(line),
            }
        }
        self.flush(&buffer, document, &mut chunks);

        debug!(
            rule_set = self.rules.name(),
            sections = buffer.index + 1,
            chunks = chunks.len(),
            "segmented document"
        );
        chunks
    }

    fn flush(&self, buffer: &SectionBuffer, document: &Document, out: &mut Vec<Chunk>) {
        let text = buffer.text.trim();
        if text.is_empty() {
            return;
        }

        let title = buffer.title.as_deref().unwrap_or("");
        let mut chunk = Chunk::new(text, document.metadata.clone());
        chunk.set(keys::SECTION, title);
        chunk.set(keys::SECTION_INDEX, buffer.index);

        let len = text.chars().count();
        if len <= 2 * self.splitter.target_size() {
            out.push(chunk);
            return;
        }

        if self.protection == ProtectionPolicy::KeepWhole && is_protected(buffer.title.as_deref()) {
            debug!(section = title, len, "keeping protected section whole");
            out.push(chunk);
            return;
        }

        let subs = self.splitter.split_chunk(&chunk);
        debug!(section = title, len, windows = subs.len(), "split oversized section");
        for mut sub in subs {
            sub.set_default(keys::SECTION, title);
            sub.set_default(keys::SECTION_INDEX, buffer.index);
            out.push(sub);
        }
    }
}

impl Chunker for SectionChunker<'_> {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.segment(document)
    }
}
