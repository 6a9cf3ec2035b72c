//! Run settings: built-in defaults, an optional TOML file, then `LINKER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "knowledge_linker.toml";

/// Headings (depth 2) whose content is eligible for linking.
pub const DEFAULT_TARGET_SECTIONS: &[&str] = &["斷語", "卦象分析", "理論要點", "重點摘要", "野鶴評註"];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub vault_root: PathBuf,
    pub cases_dir: PathBuf,
    pub glossary_dir: PathBuf,
    pub theory_dir: PathBuf,
    pub term_index: PathBuf,
    pub target_sections: Vec<String>,
    /// Document count processed by `link --test`.
    pub test_limit: usize,
}

impl Settings {
    /// Load settings. `file` overrides the default config file name; a
    /// missing file is not an error.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file_name = file
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let sections: Vec<String> = DEFAULT_TARGET_SECTIONS.iter().map(|s| s.to_string()).collect();

        let settings = Config::builder()
            .set_default("vault_root", ".")?
            .set_default("cases_dir", "cases")?
            .set_default("glossary_dir", "glossary")?
            .set_default("theory_dir", "theory")?
            .set_default("term_index", "data/term_index.json")?
            .set_default("target_sections", sections)?
            .set_default("test_limit", 5)?
            .add_source(File::with_name(&file_name).required(file.is_some()))
            .add_source(
                Environment::with_prefix("LINKER")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("target_sections"),
            )
            .build()
            .with_context(|| format!("Failed to load settings from {}", file_name))?;

        settings
            .try_deserialize()
            .context("Invalid knowledge_linker settings")
    }

    pub fn with_vault_root(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.vault_root = root;
        }
        self
    }

    pub fn cases_path(&self) -> PathBuf {
        self.resolve(&self.cases_dir)
    }

    pub fn glossary_path(&self) -> PathBuf {
        self.resolve(&self.glossary_dir)
    }

    pub fn theory_path(&self) -> PathBuf {
        self.resolve(&self.theory_dir)
    }

    pub fn term_index_path(&self) -> PathBuf {
        self.resolve(&self.term_index)
    }

    // Absolute entries are kept as given.
    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.vault_root.join(p)
        }
    }
}
