//! Configuration store.
//!
//! The catalog is split across five human-editable JSON files. A missing or
//! corrupt file falls back to the built-in default for that section, and the
//! default is persisted so subsequent loads see the same data operators
//! would edit.

use crate::catalog;
use convrisk_core::{
    Catalog, ConvRiskError, DomainTable, PatternCatalog, Result, RoleTables, SemanticTable,
    Taxonomy,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CATEGORIES_FILE: &str = "categories.json";
const PATTERNS_FILE: &str = "patterns.json";
const DOMAINS_FILE: &str = "domains.json";
const ROLES_FILE: &str = "roles.json";
const SEMANTIC_FILE: &str = "semantic.json";

/// File-backed catalog store rooted at one configuration directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Create a store over `dir`. The directory is created on first persist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The configuration directory this store reads and writes.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the full catalog, materializing built-in defaults for any
    /// section whose file is missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns [`ConvRiskError::Io`] or [`ConvRiskError::Serialization`]
    /// only when persisting a default fails; read problems degrade to the
    /// built-in default.
    pub fn load_or_init(&self) -> Result<Catalog> {
        let taxonomy: Taxonomy =
            self.load_section(CATEGORIES_FILE, catalog::builtin_taxonomy)?;
        let patterns: PatternCatalog =
            self.load_section(PATTERNS_FILE, catalog::builtin_patterns)?;
        let domains: DomainTable = self.load_section(DOMAINS_FILE, catalog::builtin_domains)?;
        let roles: RoleTables = self.load_section(ROLES_FILE, catalog::builtin_roles)?;
        let semantic: SemanticTable =
            self.load_section(SEMANTIC_FILE, catalog::builtin_semantic)?;

        Ok(Catalog {
            taxonomy,
            patterns,
            domains,
            roles,
            semantic,
        })
    }

    /// Persist the full catalog, overwriting all five section files.
    ///
    /// # Errors
    ///
    /// Returns [`ConvRiskError::Io`] when a file cannot be written.
    pub fn persist(&self, catalog: &Catalog) -> Result<()> {
        self.write_section(CATEGORIES_FILE, &catalog.taxonomy)?;
        self.write_section(PATTERNS_FILE, &catalog.patterns)?;
        self.write_section(DOMAINS_FILE, &catalog.domains)?;
        self.write_section(ROLES_FILE, &catalog.roles)?;
        self.write_section(SEMANTIC_FILE, &catalog.semantic)?;
        Ok(())
    }

    fn load_section<T>(&self, file: &str, default: impl FnOnce() -> T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let path = self.dir.join(file);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(value) => {
                        info!(file, "configuration section loaded");
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!(file, error = %e, "corrupt configuration section, restoring default");
                    }
                },
                Err(e) => {
                    warn!(file, error = %e, "unreadable configuration section, restoring default");
                }
            }
        } else {
            info!(file, "configuration section missing, materializing default");
        }
        let value = default();
        self.write_section(file, &value)?;
        Ok(value)
    }

    fn write_section<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ConvRiskError::Config(format!("cannot create {}: {e}", self.dir.display()))
        })?;
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), raw)?;
        Ok(())
    }
}
