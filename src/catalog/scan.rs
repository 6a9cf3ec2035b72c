//! Directory enumeration: the slow catalog fallback and case discovery.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use super::TermSource;
use crate::error::LinkError;

/// `*.md` files directly inside `dir`, sorted by path.
pub fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    walk_markdown(dir, Some(1))
}

/// `*.md` files anywhere under `dir`, sorted by path.
pub fn markdown_files_recursive(dir: &Path) -> Vec<PathBuf> {
    walk_markdown(dir, None)
}

fn walk_markdown(dir: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).min_depth(1).follow_links(false);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

/// Catalog source that lists glossary and theory notes by file name.
pub struct DirectorySource {
    glossary_dir: PathBuf,
    theory_dir: PathBuf,
}

impl DirectorySource {
    pub fn new(glossary_dir: impl Into<PathBuf>, theory_dir: impl Into<PathBuf>) -> Self {
        DirectorySource {
            glossary_dir: glossary_dir.into(),
            theory_dir: theory_dir.into(),
        }
    }
}

impl TermSource for DirectorySource {
    fn describe(&self) -> String {
        format!(
            "directories {} + {}",
            self.glossary_dir.display(),
            self.theory_dir.display()
        )
    }

    fn load(&self) -> Result<Vec<String>, LinkError> {
        if !self.glossary_dir.is_dir() && !self.theory_dir.is_dir() {
            return Err(LinkError::MissingCatalog);
        }

        let mut names: Vec<String> = markdown_files(&self.glossary_dir)
            .iter()
            .filter_map(|p| stem(p))
            .collect();

        for path in markdown_files(&self.theory_dir) {
            let Some(full) = stem(&path) else { continue };
            // "01_八卦章" is also known as "八卦章"
            let short = full.split_once('_').map(|(_, rest)| rest.to_string());
            names.push(full);
            names.extend(short);
        }
        Ok(names)
    }
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}
