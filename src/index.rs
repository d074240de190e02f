//! Vector index seam
//!
//! The persistent vector store and its embeddings live outside this crate.
//! [`InMemoryIndex`] ranks by keyword overlap and backs the CLI and tests.

use crate::search::{keyword_score, query_terms, rerank_with_keywords, SearchFilter, SearchResult};
use crate::types::{Chunk, Metadata};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Storage and metadata-filtered similarity search over chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Store chunks; returns their ids, in order. Re-adding a chunk replaces it.
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<Vec<String>>;

    /// Number of stored chunks whose `source` equals `source`.
    async fn count_source(&self, source: &str) -> Result<usize>;

    /// Up to `k` chunks matching `filter`, most relevant first.
    async fn search(&self, query: &str, k: usize, filter: &SearchFilter) -> Result<Vec<SearchResult>>;

    /// Metadata of every stored chunk.
    async fn all_metadata(&self) -> Result<Vec<Metadata>>;
}

/// True when the index already holds chunks from `source`.
pub async fn is_already_ingested(index: &dyn VectorIndex, source: &str) -> Result<bool> {
    Ok(index.count_source(source).await? > 0)
}

/// Stable id from the chunk's source and position.
pub fn chunk_id(chunk: &Chunk) -> String {
    let key = format!(
        "{}:{}",
        chunk.source().unwrap_or(""),
        chunk.chunk_index().unwrap_or(-1)
    );
    format!("{:x}", md5::compute(key.as_bytes()))
}

/// Process-local index, insertion ordered.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<(String, Chunk)>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add_chunks(&self, chunks: &[Chunk]) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = chunk_id(chunk);
            match entries.iter_mut().find(|(existing, _)| *existing == id) {
                Some(entry) => entry.1 = chunk.clone(),
                None => entries.push((id.clone(), chunk.clone())),
            }
            ids.push(id);
        }
        debug!(added = ids.len(), total = entries.len(), "indexed chunks");
        Ok(ids)
    }

    async fn count_source(&self, source: &str) -> Result<usize> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(_, chunk)| chunk.source() == Some(source))
            .count())
    }

    async fn search(&self, query: &str, k: usize, filter: &SearchFilter) -> Result<Vec<SearchResult>> {
        let terms = query_terms(query);
        let entries = self.entries.read().await;
        let candidates: Vec<SearchResult> = entries
            .iter()
            .filter(|(_, chunk)| filter.matches(&chunk.metadata))
            .filter_map(|(id, chunk)| {
                let score = keyword_score(&terms, &chunk.text);
                (score > 0.0).then(|| SearchResult {
                    id: id.clone(),
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect();
        drop(entries);

        let mut results = rerank_with_keywords(candidates, query);
        results.truncate(k);
        debug!(query, filters = filter.conditions().len(), found = results.len(), "searched index");
        Ok(results)
    }

    async fn all_metadata(&self) -> Result<Vec<Metadata>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|(_, chunk)| chunk.metadata.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::keys;

    fn chunk(source: &str, index: i64, institution: &str, text: &str) -> Chunk {
        let mut chunk = Chunk::new(text, Metadata::new());
        chunk.set(keys::SOURCE, source);
        chunk.set(keys::CHUNK_INDEX, index);
        chunk.set(keys::INSTITUTION, institution);
        chunk.set(keys::YEAR, 2023i64);
        chunk
    }

    #[test]
    fn test_chunk_id_is_stable() {
        let a = chunk("a.pdf", 0, "IGF", "x");
        let b = chunk("a.pdf", 0, "IGF", "different text");
        let c = chunk("a.pdf", 1, "IGF", "x");
        assert_eq!(chunk_id(&a), chunk_id(&b));
        assert_ne!(chunk_id(&a), chunk_id(&c));
        assert_eq!(chunk_id(&a).len(), 32);
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let index = InMemoryIndex::new();
        let ids = index
            .add_chunks(&[chunk("a.pdf", 0, "IGF", "un"), chunk("a.pdf", 1, "IGF", "deux")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(index.count_source("a.pdf").await.unwrap(), 2);
        assert_eq!(index.count_source("b.pdf").await.unwrap(), 0);
        assert!(is_already_ingested(&index, "a.pdf").await.unwrap());
        assert!(!is_already_ingested(&index, "b.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_re_adding_replaces() {
        let index = InMemoryIndex::new();
        index.add_chunks(&[chunk("a.pdf", 0, "IGF", "ancien")]).await.unwrap();
        index.add_chunks(&[chunk("a.pdf", 0, "IGF", "nouveau")]).await.unwrap();
        assert_eq!(index.len().await, 1);
        let results = index.search("nouveau", 5, &SearchFilter::new()).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_filters_and_ranks() {
        let index = InMemoryIndex::new();
        index
            .add_chunks(&[
                chunk("a.pdf", 0, "IGF", "Les dépenses fiscales progressent."),
                chunk("a.pdf", 1, "IGF", "Les effectifs sont stables."),
                chunk("b.pdf", 0, "Cour des comptes", "Dépenses fiscales et niches fiscales."),
            ])
            .await
            .unwrap();

        let all = index.search("dépenses fiscales", 10, &SearchFilter::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let igf = index
            .search("dépenses fiscales", 10, &SearchFilter::new().institution("igf"))
            .await
            .unwrap();
        assert_eq!(igf.len(), 1);
        assert_eq!(igf[0].chunk.source(), Some("a.pdf"));

        let top = index.search("dépenses", 1, &SearchFilter::new()).await.unwrap();
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn test_all_metadata() {
        let index = InMemoryIndex::new();
        assert!(index.is_empty().await);
        index.add_chunks(&[chunk("a.pdf", 0, "IGF", "x")]).await.unwrap();
        let metadata = index.all_metadata().await.unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0][keys::INSTITUTION].as_str(), Some("IGF"));
    }
}
