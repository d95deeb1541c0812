//! Migration config file.
//!
//! The file names the two roots of a run:
//!
//! ```yaml
//! import:
//!   path: ./notion-export
//! export:
//!   path: ./vault
//! ```
//!
//! Capitalized keys (`Import`, `Path`) are accepted as well.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file looked up relative to the working directory.
pub const C_FILE_CONF_DEFAULT: &str = "import-conf.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecConfSection {
    #[serde(default, alias = "Path")]
    pub path: String,
}

/// Raw shape of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecConfFile {
    #[serde(default, alias = "Import")]
    pub import: SpecConfSection,
    #[serde(default, alias = "Export")]
    pub export: SpecConfSection,
}

/// Validated import/export pair, immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMigrateConf {
    pub path_dir_import: PathBuf,
    pub path_dir_export: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfError {
    #[error("{} is required to exist: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Both Import and Export paths should be non-empty")]
    EmptyPath,
}

impl SpecConfFile {
    /// Read and parse the config file at `path_file_conf`.
    pub fn load(path_file_conf: &Path) -> Result<Self, ConfError> {
        let txt_conf = fs::read_to_string(path_file_conf).map_err(|e| ConfError::Read {
            path: path_file_conf.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&txt_conf).map_err(|e| ConfError::Parse {
            path: path_file_conf.to_path_buf(),
            source: e,
        })
    }

    /// Merge command-line overrides and check both roots are set.
    pub fn into_conf(
        self,
        path_dir_import: Option<PathBuf>,
        path_dir_export: Option<PathBuf>,
    ) -> Result<SpecMigrateConf, ConfError> {
        SpecMigrateConf::new(
            path_dir_import.unwrap_or_else(|| PathBuf::from(self.import.path)),
            path_dir_export.unwrap_or_else(|| PathBuf::from(self.export.path)),
        )
    }
}

impl SpecMigrateConf {
    /// Build a config pair, rejecting empty roots.
    pub fn new(path_dir_import: PathBuf, path_dir_export: PathBuf) -> Result<Self, ConfError> {
        if path_dir_import.as_os_str().is_empty() || path_dir_export.as_os_str().is_empty() {
            return Err(ConfError::EmptyPath);
        }
        Ok(Self {
            path_dir_import,
            path_dir_export,
        })
    }
}

/// Resolve the run config from the file and command-line overrides.
///
/// When both roots are given on the command line the file is not read.
pub fn load_conf(
    path_file_conf: &Path,
    path_dir_import: Option<PathBuf>,
    path_dir_export: Option<PathBuf>,
) -> Result<SpecMigrateConf, ConfError> {
    match (path_dir_import, path_dir_export) {
        (Some(path_dir_import), Some(path_dir_export)) => {
            SpecMigrateConf::new(path_dir_import, path_dir_export)
        }
        (path_dir_import, path_dir_export) => {
            SpecConfFile::load(path_file_conf)?.into_conf(path_dir_import, path_dir_export)
        }
    }
}
