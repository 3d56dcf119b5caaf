//! TOML configuration: named catalog connection strings and audit defaults.
//!
//! ```toml
//! [server]
//! prod_rw = "server=tcp:gisdb,1433;database=gis;user=auditor;password=..."
//!
//! [audit]
//! targets = ["prod_rw"]
//! membership_csv = "group_members.csv"
//! output_dir = "."
//! log_dir = "."
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::source::CatalogTarget;
use crate::error::{Error, Result};

/// Config file used when neither `--config` nor `SDE_EDITORS_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Target audited when the config names none.
pub const DEFAULT_TARGET: &str = "prod_rw";
/// Membership export read when the config names none.
pub const DEFAULT_MEMBERSHIP_CSV: &str = "group_members.csv";

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Logical target name → ADO.NET connection string.
    #[serde(default)]
    pub server: BTreeMap<String, String>,
    /// Audit defaults.
    #[serde(default)]
    pub audit: AuditSection,
}

/// The `[audit]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    /// Targets audited in order when the command line names none.
    pub targets: Vec<String>,
    /// Group membership export.
    pub membership_csv: PathBuf,
    /// Directory the JSON mappings and exports are written to.
    pub output_dir: PathBuf,
    /// Directory the dated log file is written to.
    pub log_dir: PathBuf,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            targets: vec![DEFAULT_TARGET.to_string()],
            membership_csv: PathBuf::from(DEFAULT_MEMBERSHIP_CSV),
            output_dir: PathBuf::from("."),
            log_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Read and parse `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Pair each requested name with its descriptor, keeping request order.
    ///
    /// An empty request falls back to `[audit] targets`.
    pub fn resolve_targets(&self, names: &[String]) -> Result<Vec<CatalogTarget>> {
        let names = if names.is_empty() {
            self.audit.targets.as_slice()
        } else {
            names
        };
        names
            .iter()
            .map(|name| {
                self.server
                    .get(name)
                    .map(|descriptor| CatalogTarget::new(name.as_str(), descriptor.as_str()))
                    .ok_or_else(|| Error::UnknownTarget(name.clone()))
            })
            .collect()
    }
}
