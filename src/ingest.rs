//! Ingestion: report files to chunks, and catalogue folders to an index.

use crate::catalogue::Catalogue;
use crate::chunking::{ChunkStats, ReportChunker, ReportInfo};
use crate::index::{is_already_ingested, VectorIndex};
use crate::loader::{ensure_exists, DocumentLoader, TextLoader};
use crate::progress::IngestProgress;
use crate::types::Chunk;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Chunks of one report and their summary.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub chunks: Vec<Chunk>,
    pub stats: ChunkStats,
}

/// Tally of a catalogue run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogueRun {
    pub ingested: usize,
    /// Catalogued files absent from the folder
    pub missing: usize,
    /// Sources the index already holds
    pub duplicate: usize,
    /// Reports with no chunk after filtering
    pub empty: usize,
    /// Reports that could not be loaded or chunked
    pub failed: usize,
    pub chunks: usize,
}

pub struct Ingestor<L = TextLoader> {
    chunker: ReportChunker,
    loader: L,
}

impl Ingestor<TextLoader> {
    pub fn new(chunker: ReportChunker) -> Self {
        Self::with_loader(chunker, TextLoader::new())
    }
}

impl<L: DocumentLoader> Ingestor<L> {
    pub fn with_loader(chunker: ReportChunker, loader: L) -> Self {
        Self { chunker, loader }
    }

    pub fn chunker(&self) -> &ReportChunker {
        &self.chunker
    }

    /// Load and chunk one report file.
    pub fn ingest_file(&self, path: &Path, report: &ReportInfo) -> Result<IngestOutcome> {
        ensure_exists(path)?;
        let document = self.loader.load(path)?;
        let chunks = self.chunker.chunk_report(&document, report)?;
        let stats = ChunkStats::of(&chunks);

        info!(
            source = %report.source,
            chunks = stats.chunks,
            average_length = stats.average_length,
            with_section = stats.with_section,
            "ingested report"
        );
        Ok(IngestOutcome { chunks, stats })
    }

    /// Ingest every catalogued report of `folder` not yet in `index`.
    ///
    /// Missing files, duplicates and per-report failures are counted and
    /// skipped; only index errors abort the run.
    pub async fn ingest_catalogue(
        &self,
        index: &dyn VectorIndex,
        folder: &Path,
        catalogue: &Catalogue,
        progress: &mut IngestProgress,
    ) -> Result<CatalogueRun> {
        let mut run = CatalogueRun::default();

        for entry in &catalogue.reports {
            progress.start_report(&entry.file);
            let path = entry.path(folder);
            if !path.exists() {
                warn!(file = %entry.file, "catalogued file not found");
                run.missing += 1;
                progress.skip_report();
                continue;
            }

            let report = entry.report_info(folder);
            if is_already_ingested(index, &report.source).await? {
                warn!(source = %report.source, "already ingested, skipping");
                run.duplicate += 1;
                progress.skip_report();
                continue;
            }

            let outcome = match self.ingest_file(&path, &report) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(file = %entry.file, error = %e, "failed to ingest report");
                    run.failed += 1;
                    progress.skip_report();
                    continue;
                }
            };

            if outcome.chunks.is_empty() {
                run.empty += 1;
                progress.skip_report();
                continue;
            }

            index.add_chunks(&outcome.chunks).await?;
            run.ingested += 1;
            run.chunks += outcome.chunks.len();
            progress.finish_report(outcome.chunks.len());
        }

        progress.complete();
        info!(
            ingested = run.ingested,
            missing = run.missing,
            duplicate = run.duplicate,
            empty = run.empty,
            failed = run.failed,
            chunks = run.chunks,
            "catalogue run finished"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::CatalogueEntry;
    use crate::config::ChunkingConfig;
    use crate::error::RapportsError;
    use crate::index::InMemoryIndex;
    use tempfile::TempDir;

    const REPORT_TEXT: &str = "SYNTHÈSE\n\
La Cour a examiné la gestion des dépenses fiscales entre 2018 et 2022. Elle constate une \
progression continue du coût des dispositifs, sans évaluation régulière de leur efficacité.\n\
\x0c\
RÉCAPITULATIF DES RECOMMANDATIONS\n\
Recommandation n° 1 : évaluer chaque dépense fiscale avant sa reconduction. Recommandation n° 2 : \
plafonner le coût des dispositifs les plus dynamiques et publier un bilan annuel.\n";

    fn ingestor() -> Ingestor {
        Ingestor::new(ReportChunker::new(ChunkingConfig::default(), &[]).unwrap())
    }

    fn entry(file: &str) -> CatalogueEntry {
        CatalogueEntry {
            file: file.to_string(),
            institution: "Cour des comptes".to_string(),
            year: 2023,
            title: "Les dépenses fiscales".to_string(),
            theme: "finances publiques".to_string(),
        }
    }

    #[test]
    fn test_ingest_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("depenses.txt");
        std::fs::write(&path, REPORT_TEXT).unwrap();

        let report = entry("depenses.txt").report_info(dir.path());
        let outcome = ingestor().ingest_file(&path, &report).unwrap();

        assert_eq!(outcome.stats.chunks, 2);
        assert_eq!(outcome.stats.with_section, 2);
        assert_eq!(outcome.chunks[1].section(), "RÉCAPITULATIF DES RECOMMANDATIONS");
        assert_eq!(outcome.chunks[1].source(), Some(report.source.as_str()));
    }

    #[test]
    fn test_missing_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.txt");
        let report = entry("absent.txt").report_info(dir.path());
        let err = ingestor().ingest_file(&path, &report).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RapportsError>(),
            Some(RapportsError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_catalogue_run_counts_each_outcome() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), REPORT_TEXT).unwrap();
        std::fs::write(dir.path().join("court.txt"), "Trop court.").unwrap();
        std::fs::write(dir.path().join("scan.pdf"), b"%PDF-1.7").unwrap();

        let mut catalogue = Catalogue::default();
        catalogue.add(entry("a.txt"));
        catalogue.add(entry("court.txt"));
        catalogue.add(entry("absent.txt"));
        catalogue.add(entry("scan.pdf"));

        let index = InMemoryIndex::new();
        let ingestor = ingestor();

        let mut progress = IngestProgress::quiet(catalogue.len());
        let run = ingestor
            .ingest_catalogue(&index, dir.path(), &catalogue, &mut progress)
            .await
            .unwrap();
        assert_eq!(
            run,
            CatalogueRun {
                ingested: 1,
                missing: 1,
                duplicate: 0,
                empty: 1,
                failed: 1,
                chunks: 2,
            }
        );
        assert_eq!(progress.position(), 4);
        assert_eq!(index.len().await, 2);

        // Second pass: the ingested report is skipped
        let mut progress = IngestProgress::quiet(catalogue.len());
        let again = ingestor
            .ingest_catalogue(&index, dir.path(), &catalogue, &mut progress)
            .await
            .unwrap();
        assert_eq!(again.duplicate, 1);
        assert_eq!(again.ingested, 0);
        assert_eq!(index.len().await, 2);
    }
}
