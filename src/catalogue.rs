//! Report catalogue
//!
//! One TOML entry per report file in a folder, carrying the metadata the
//! chunker attaches to every chunk:
//!
//! ```toml
//! [[report]]
//! file = "igf-jetons-2023.pdf"
//! institution = "IGF"
//! year = 2023
//! title = "Les jetons numériques"
//! theme = "finances publiques"
//! ```

use crate::chunking::ReportInfo;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File extensions a report folder may hold
pub const REPORT_EXTENSIONS: &[&str] = &["pdf", "txt"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    /// File name relative to the report folder
    pub file: String,
    pub institution: String,
    pub year: i64,
    pub title: String,
    #[serde(default)]
    pub theme: String,
}

impl CatalogueEntry {
    pub fn path(&self, folder: &Path) -> PathBuf {
        folder.join(&self.file)
    }

    /// Descriptor for the chunker; the source is the file's path.
    pub fn report_info(&self, folder: &Path) -> ReportInfo {
        ReportInfo {
            institution: self.institution.clone(),
            year: self.year,
            title: self.title.clone(),
            theme: self.theme.clone(),
            source: self.path(folder).to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    #[serde(default, rename = "report")]
    pub reports: Vec<CatalogueEntry>,
}

impl Catalogue {
    /// Load a catalogue; a missing file is an empty catalogue.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no catalogue yet");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalogue {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse catalogue {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create catalogue directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize catalogue")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write catalogue {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.reports.iter().any(|r| r.file == file)
    }

    /// Add an entry; false when its file is already catalogued.
    pub fn add(&mut self, entry: CatalogueEntry) -> bool {
        if self.contains(&entry.file) {
            return false;
        }
        self.reports.push(entry);
        true
    }

    /// Report files under `folder` with no catalogue entry, sorted.
    pub fn uncatalogued(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let known: HashSet<&str> = self.reports.iter().map(|r| r.file.as_str()).collect();
        let mut missing = Vec::new();

        for entry in WalkDir::new(folder).follow_links(true) {
            let entry = entry.with_context(|| format!("Failed to walk {}", folder.display()))?;
            if !entry.file_type().is_file() || !is_report_file(entry.path()) {
                continue;
            }
            if is_extraction_sidecar(entry.path()) {
                continue;
            }
            let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
            let name = relative.to_string_lossy();
            if !known.contains(&*name) {
                missing.push(entry.path().to_path_buf());
            }
        }

        missing.sort();
        Ok(missing)
    }
}

/// `x.txt` next to `x.pdf` is the extracted text of that PDF.
fn is_extraction_sidecar(path: &Path) -> bool {
    let is_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    is_txt && path.with_extension("pdf").exists()
}

fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| REPORT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(file: &str) -> CatalogueEntry {
        CatalogueEntry {
            file: file.to_string(),
            institution: "IGF".to_string(),
            year: 2023,
            title: "Les jetons numériques".to_string(),
            theme: "finances publiques".to_string(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalogue = Catalogue::load(&dir.path().join("catalogue.toml")).unwrap();
        assert!(catalogue.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut catalogue = Catalogue::default();
        assert!(catalogue.add(entry("a.pdf")));
        assert!(!catalogue.add(entry("a.pdf")));
        assert_eq!(catalogue.len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalogue.toml");
        let mut catalogue = Catalogue::default();
        catalogue.add(entry("a.pdf"));
        catalogue.add(entry("b.txt"));
        catalogue.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[[report]]"));
        assert_eq!(Catalogue::load(&path).unwrap(), catalogue);
    }

    #[test]
    fn test_theme_defaults_to_empty() {
        let parsed: Catalogue = toml::from_str(
            r#"
            [[report]]
            file = "a.pdf"
            institution = "Cour des comptes"
            year = 2021
            title = "La dette"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.reports[0].theme, "");
    }

    #[test]
    fn test_uncatalogued_lists_report_files_only() {
        let dir = TempDir::new().unwrap();
        for name in ["a.pdf", "b.TXT", "notes.md", "c.pdf", "c.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let mut catalogue = Catalogue::default();
        catalogue.add(entry("a.pdf"));

        let missing = catalogue.uncatalogued(dir.path()).unwrap();
        let names: Vec<_> = missing
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.TXT", "c.pdf"]);
    }

    #[test]
    fn test_report_info_uses_file_path() {
        let info = entry("a.pdf").report_info(Path::new("data/raw"));
        assert_eq!(info.source, Path::new("data/raw").join("a.pdf").to_string_lossy());
        assert_eq!(info.year, 2023);
    }
}
