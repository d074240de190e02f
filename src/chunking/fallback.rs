//! Fallback Chunker
//!
//! Fixed-size overlapping windows, blind to headings. Splits on the coarsest
//! separator present (blank-line runs, line breaks, sentence ends, spaces) and
//! only cuts inside words when nothing else fits. Used on whole documents by
//! the recursive strategy and on oversized sections by the section chunker.

use super::{Chunker, OVERLAP, TARGET_SIZE};
use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{keys, Chunk, Document};
use std::collections::VecDeque;

/// Separators in priority order. The empty separator cuts between characters.
pub const SEPARATORS: &[&str] = &["\n\n\n", "\n\n", "\n", ". ", " ", ""];

/// A window of text and its character offset in the text it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub text: String,
    pub start: usize,
}

/// Fixed-window chunker with overlap
#[derive(Debug, Clone)]
pub struct FallbackChunker {
    target_size: usize,
    overlap: usize,
}

impl FallbackChunker {
    pub fn new() -> Self {
        Self {
            target_size: TARGET_SIZE,
            overlap: OVERLAP,
        }
    }

    pub fn with_sizes(target_size: usize, overlap: usize) -> Self {
        Self {
            target_size,
            overlap,
        }
    }

    /// Build from validated configuration.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_sizes(config.chunk_size, config.chunk_overlap))
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into trimmed windows of at most `target_size` characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_windows(text)
            .into_iter()
            .map(|window| window.text)
            .collect()
    }

    /// Split text and locate each window in it.
    pub fn split_windows(&self, text: &str) -> Vec<Window> {
        let mut spans = Vec::new();
        self.split_recursive(text, 0, SEPARATORS, &mut spans);

        let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        spans
            .into_iter()
            .map(|(byte, text)| Window {
                text,
                start: boundaries.partition_point(|&b| b < byte),
            })
            .collect()
    }

    /// Split a chunk into sub-chunks carrying its metadata plus `start_index`.
    pub fn split_chunk(&self, chunk: &Chunk) -> Vec<Chunk> {
        self.split_windows(&chunk.text)
            .into_iter()
            .map(|window| {
                let mut sub = Chunk::new(window.text, chunk.metadata.clone());
                sub.set(keys::START_INDEX, window.start);
                sub
            })
            .collect()
    }

    /// Push `(byte offset, window)` pairs for `text`, which starts at `offset`
    /// in the text being split.
    fn split_recursive(
        &self,
        text: &str,
        offset: usize,
        separators: &[&str],
        out: &mut Vec<(usize, String)>,
    ) {
        // Coarsest separator present in this text; the rest are for oversized pieces
        let mut separator = "";
        let mut finer: &[&str] = &[];
        for (i, &candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut fitting: Vec<Piece> = Vec::new();
        for (at, piece) in split_keep_separator(text, separator) {
            let at = offset + at;
            let len = piece.chars().count();
            if len < self.target_size {
                fitting.push(Piece { at, text: piece, len });
                continue;
            }
            if !fitting.is_empty() {
                self.merge_pieces(&fitting, out);
                fitting.clear();
            }
            if finer.is_empty() {
                out.push((at, piece.to_string()));
            } else {
                self.split_recursive(piece, at, finer, out);
            }
        }
        if !fitting.is_empty() {
            self.merge_pieces(&fitting, out);
        }
    }

    /// Greedily pack contiguous pieces into windows, carrying up to `overlap`
    /// characters of trailing pieces into the next window.
    fn merge_pieces(&self, pieces: &[Piece], out: &mut Vec<(usize, String)>) {
        let mut current: VecDeque<&Piece> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            if total + piece.len > self.target_size && !current.is_empty() {
                out.extend(join_trimmed(&current));
                while total > self.overlap || (total + piece.len > self.target_size && total > 0) {
                    match current.pop_front() {
                        Some(dropped) => total -= dropped.len,
                        None => break,
                    }
                }
            }
            current.push_back(piece);
            total += piece.len;
        }

        out.extend(join_trimmed(&current));
    }
}

/// A slice of the text being split, with its byte offset and char length.
struct Piece<'t> {
    at: usize,
    text: &'t str,
    len: usize,
}

/// Split on `separator`, keeping it at the start of the piece that follows.
/// Pieces come with their byte offset in `text`. Empty pieces are dropped;
/// the empty separator yields single characters.
fn split_keep_separator<'t>(text: &'t str, separator: &str) -> Vec<(usize, &'t str)> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| (i, &text[i..i + c.len_utf8()]))
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            pieces.push((last, &text[last..idx]));
        }
        last = idx;
    }
    pieces.push((last, &text[last..]));
    pieces.retain(|(_, p)| !p.is_empty());
    pieces
}

/// Join contiguous pieces and trim, keeping the byte offset of the first
/// non-whitespace character.
fn join_trimmed(pieces: &VecDeque<&Piece>) -> Option<(usize, String)> {
    let first = pieces.front()?.at;
    let joined: String = pieces.iter().map(|p| p.text).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return None;
    }
    let leading = joined.len() - joined.trim_start().len();
    Some((first + leading, trimmed.to_string()))
}

impl Default for FallbackChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for FallbackChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.is_blank() {
            return Vec::new();
        }
        self.split_chunk(&Chunk::new(document.text.clone(), document.metadata.clone()))
    }
}
