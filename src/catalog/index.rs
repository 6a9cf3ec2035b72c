//! The precomputed term index (`data/term_index.json`) and its builder.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::scan::markdown_files;
use super::TermSource;
use crate::error::LinkError;

pub const GLOSSARY: &str = "glossary";
pub const THEORY: &str = "theory";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermIndex {
    #[serde(default)]
    pub metadata: IndexMetadata,
    #[serde(default)]
    pub glossary: Vec<TermEntry>,
    #[serde(default)]
    pub theory: Vec<TermEntry>,
    #[serde(default)]
    pub term_names: Option<TermNames>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub total_terms: usize,
    pub glossary_count: usize,
    pub theory_count: usize,
    #[serde(default)]
    pub generated_by: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub name: String,
    pub category: String,
    #[serde(alias = "source_path")]
    pub file_path: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermNames {
    #[serde(default)]
    pub glossary: Vec<String>,
    #[serde(default)]
    pub theory: Vec<String>,
}

impl TermIndex {
    /// Glossary names then theory names.
    pub fn names(&self) -> Vec<String> {
        match &self.term_names {
            Some(names) => names.glossary.iter().chain(&names.theory).cloned().collect(),
            None => self
                .glossary
                .iter()
                .chain(&self.theory)
                .map(|e| e.name.clone())
                .collect(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, LinkError> {
        let raw = fs::read_to_string(path).map_err(|source| LinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| LinkError::Index {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), LinkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| LinkError::Index {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| LinkError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Catalog source backed by the term index file.
pub struct IndexSource {
    path: PathBuf,
}

impl IndexSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        IndexSource { path: path.into() }
    }
}

impl TermSource for IndexSource {
    fn describe(&self) -> String {
        format!("index {}", self.path.display())
    }

    fn load(&self) -> Result<Vec<String>, LinkError> {
        Ok(TermIndex::read(&self.path)?.names())
    }
}

/// Scan the glossary and theory directories into a fresh index.
pub fn build_index(glossary_dir: &Path, theory_dir: &Path, vault_root: &Path) -> TermIndex {
    let glossary = scan_entries(glossary_dir, GLOSSARY, vault_root);
    let theory = scan_entries(theory_dir, THEORY, vault_root);
    info!(glossary = glossary.len(), theory = theory.len(), "Scanned term directories");

    TermIndex {
        metadata: IndexMetadata {
            total_terms: glossary.len() + theory.len(),
            glossary_count: glossary.len(),
            theory_count: theory.len(),
            generated_by: env!("CARGO_PKG_NAME").to_string(),
            generated_at: Some(Utc::now()),
        },
        term_names: Some(TermNames {
            glossary: glossary.iter().map(|e| e.name.clone()).collect(),
            theory: theory.iter().map(|e| e.name.clone()).collect(),
        }),
        glossary,
        theory,
    }
}

fn scan_entries(dir: &Path, category: &str, vault_root: &Path) -> Vec<TermEntry> {
    if !dir.is_dir() {
        warn!("Directory does not exist: {}", dir.display());
        return Vec::new();
    }

    markdown_files(dir)
        .into_iter()
        .filter(|p| {
            !p.file_name()
                .map(|n| n.to_string_lossy().eq_ignore_ascii_case("README.md"))
                .unwrap_or(false)
        })
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().into_owned();
            let description = match fs::read_to_string(&path) {
                Ok(text) => first_line_title(&text),
                Err(e) => {
                    warn!("Cannot read {}: {}", path.display(), e);
                    name.clone()
                }
            };
            let file_path = path
                .strip_prefix(vault_root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            debug!(%name, %file_path, "Indexed term");
            Some(TermEntry {
                name,
                category: category.to_string(),
                file_path,
                description,
            })
        })
        .collect()
}

fn first_line_title(text: &str) -> String {
    text.split('\n')
        .next()
        .unwrap_or_default()
        .replace('#', "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let g = dir.path().join("glossary");
        let t = dir.path().join("theory");
        fs::create_dir_all(&g).unwrap();
        fs::create_dir_all(&t).unwrap();
        fs::write(g.join("用神.md"), "# 用神\n\n主事之爻").unwrap();
        fs::write(g.join("旬空.md"), "## 旬空 (空亡)\n").unwrap();
        fs::write(g.join("README.md"), "# index").unwrap();
        fs::write(t.join("01_八卦章.md"), "# 八卦章").unwrap();
        dir
    }

    #[test]
    fn builds_sorted_entries_without_readme() {
        let dir = vault();
        let idx = build_index(&dir.path().join("glossary"), &dir.path().join("theory"), dir.path());
        let names: Vec<&str> = idx.glossary.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["旬空", "用神"]);
        assert_eq!(idx.metadata.total_terms, 3);
        assert_eq!(idx.glossary[0].description, "旬空 (空亡)");
        assert_eq!(idx.theory[0].category, THEORY);
        assert_eq!(idx.theory[0].file_path, "theory/01_八卦章.md");
    }

    #[test]
    fn missing_directory_contributes_nothing() {
        let dir = vault();
        let idx = build_index(&dir.path().join("nope"), &dir.path().join("theory"), dir.path());
        assert!(idx.glossary.is_empty());
        assert_eq!(idx.names(), vec!["01_八卦章".to_string()]);
    }

    #[test]
    fn written_index_feeds_index_source() {
        let dir = vault();
        let idx = build_index(&dir.path().join("glossary"), &dir.path().join("theory"), dir.path());
        let path = dir.path().join("data").join("term_index.json");
        idx.write(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("用神"), "non-ASCII names must stay readable");

        let names = IndexSource::new(&path).load().unwrap();
        assert_eq!(names, vec!["旬空", "用神", "01_八卦章"]);
    }

    #[test]
    fn entries_used_when_name_lists_absent() {
        let json = r#"{
            "glossary": [{"name": "用神", "category": "glossary", "source_path": "glossary/用神.md"}],
            "theory": [{"name": "六親", "category": "theory", "file_path": "theory/六親.md"}]
        }"#;
        let idx: TermIndex = serde_json::from_str(json).unwrap();
        assert_eq!(idx.names(), vec!["用神", "六親"]);
    }

    #[test]
    fn unreadable_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("term_index.json");
        assert!(matches!(IndexSource::new(&path).load(), Err(LinkError::Read { .. })));
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(IndexSource::new(&path).load(), Err(LinkError::Index { .. })));
    }
}
