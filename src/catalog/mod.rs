pub mod index;
pub mod scan;

use std::collections::HashSet;

use tracing::{info, warn};

use crate::error::LinkError;

pub use index::IndexSource;
pub use scan::DirectorySource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub name: String,
    /// Length in characters, not bytes.
    pub length: usize,
}

/// Terms in match priority order: longest first, so compounds are linked
/// before the shorter terms they contain.
#[derive(Debug, Clone, Default)]
pub struct TermCatalog {
    terms: Vec<Term>,
}

impl TermCatalog {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut terms: Vec<Term> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| seen.insert(name.clone()))
            .map(|name| Term {
                length: name.chars().count(),
                name,
            })
            // single characters match far too much
            .filter(|t| t.length > 1)
            .collect();
        // stable: equal lengths keep first-seen order
        terms.sort_by(|a, b| b.length.cmp(&a.length));
        TermCatalog { terms }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Somewhere term names come from.
pub trait TermSource {
    fn describe(&self) -> String;
    fn load(&self) -> Result<Vec<String>, LinkError>;
}

/// Build the catalog from the first source that yields any terms.
/// Never fails: with no usable source the catalog is empty.
pub fn load_catalog(sources: &[&dyn TermSource]) -> TermCatalog {
    for source in sources {
        match source.load() {
            Ok(names) if !names.is_empty() => {
                let catalog = TermCatalog::from_names(names);
                info!(source = %source.describe(), terms = catalog.len(), "Loaded term catalog");
                return catalog;
            }
            Ok(_) => warn!(source = %source.describe(), "Term source is empty, trying next"),
            Err(e) => warn!(source = %source.describe(), error = %e, "Term source failed, trying next"),
        }
    }
    warn!("{}; continuing with an empty catalog", LinkError::MissingCatalog);
    TermCatalog::default()
}
