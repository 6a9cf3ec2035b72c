//! Per-document linking pipeline and the batch run over a case corpus.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, error};

use crate::catalog::scan::markdown_files_recursive;
use crate::catalog::TermCatalog;
use crate::error::LinkError;
use crate::linker::{annotate, rewrite, SectionChange};
use crate::parser::{extract_sections, Document};

const CHUNK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Compute everything, write nothing.
    Preview,
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Changed (written in commit mode, would be written in preview).
    Modified,
    Unchanged,
    NoTargetSections,
}

#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub status: Status,
    /// Sections whose text changed.
    pub sections: Vec<SectionChange>,
}

impl DocumentOutcome {
    pub fn links_inserted(&self) -> usize {
        self.sections.iter().map(|s| s.annotation.links_inserted()).sum()
    }
}

/// Case documents under `cases_dir`, sorted, optionally truncated.
pub fn collect_documents(cases_dir: &Path, limit: Option<usize>) -> Vec<PathBuf> {
    let mut files = markdown_files_recursive(cases_dir);
    if let Some(n) = limit {
        files.truncate(n);
    }
    files
}

pub fn process_document<S: AsRef<str>>(
    path: &Path,
    catalog: &TermCatalog,
    allow_list: &[S],
    mode: Mode,
) -> Result<DocumentOutcome, LinkError> {
    let bytes = fs::read(path).map_err(|source| LinkError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = String::from_utf8(bytes)
        .map_err(|e| LinkError::malformed(path, format!("invalid UTF-8: {}", e)))?;
    let document = Document::parse(path, raw)?;

    let sections = extract_sections(&document.body, allow_list);
    if sections.is_empty() {
        return Ok(DocumentOutcome {
            path: path.to_path_buf(),
            status: Status::NoTargetSections,
            sections: Vec::new(),
        });
    }

    let changes: Vec<SectionChange> = sections
        .into_iter()
        .filter_map(|section| {
            let content = section.content(&document.body);
            let annotation = annotate(content, catalog);
            (annotation.text != content).then(|| SectionChange {
                title: section.title,
                range: section.range,
                annotation,
            })
        })
        .collect();

    let result = rewrite(&document, &changes);
    if !result.changed {
        return Ok(DocumentOutcome {
            path: path.to_path_buf(),
            status: Status::Unchanged,
            sections: changes,
        });
    }

    if mode == Mode::Commit {
        fs::write(path, result.document.to_raw()).map_err(|source| LinkError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Wrote document");
    }

    Ok(DocumentOutcome {
        path: path.to_path_buf(),
        status: Status::Modified,
        sections: changes,
    })
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub scanned: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub no_target_sections: usize,
    pub links_inserted: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl RunSummary {
    fn record(&mut self, path: &Path, result: &Result<DocumentOutcome, LinkError>) {
        self.scanned += 1;
        match result {
            Ok(outcome) => {
                match outcome.status {
                    Status::Modified => self.modified += 1,
                    Status::Unchanged => self.unchanged += 1,
                    Status::NoTargetSections => self.no_target_sections += 1,
                }
                self.links_inserted += outcome.links_inserted();
            }
            Err(e) => self.errors.push((path.to_path_buf(), e.to_string())),
        }
    }
}

pub struct RunReport {
    /// One entry per input path, in input order.
    pub results: Vec<(PathBuf, Result<DocumentOutcome, LinkError>)>,
    pub summary: RunSummary,
}

/// Process every document in parallel chunks. A failing document is reported
/// and skipped; it never stops the batch.
pub fn run<S: AsRef<str> + Sync>(
    paths: &[PathBuf],
    catalog: &TermCatalog,
    allow_list: &[S],
    mode: Mode,
    progress: &ProgressBar,
) -> RunReport {
    let mut summary = RunSummary::default();
    let mut results = Vec::with_capacity(paths.len());

    for chunk in paths.chunks(CHUNK_SIZE) {
        let processed: Vec<_> = chunk
            .par_iter()
            .map(|path| {
                let result = process_document(path, catalog, allow_list, mode);
                if let Err(e) = &result {
                    error!(path = %path.display(), error = %e, "Skipping document");
                }
                (path.clone(), result)
            })
            .collect();

        for (path, result) in &processed {
            summary.record(path, result);
        }
        results.extend(processed);
        progress.inc(chunk.len() as u64);
    }

    RunReport { results, summary }
}
