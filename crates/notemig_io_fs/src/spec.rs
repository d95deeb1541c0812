//! Migration specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region Constants

/// Path marker left behind by the source note system for database stubs.
pub const C_MARKER_UNTITLED_DATABASE: &str = "Untitled Database";
/// Only files with this (case-sensitive) suffix are migrated.
pub const C_SUFFIX_NOTE: &str = ".md";
/// Whitespace followed by the 32 lowercase hex digits of an identifier token.
pub const C_PATTERN_IDENTIFIER: &str = r"(?-u:\s)[0-9a-f]{32}";
/// `Created:` property line near the top of a note.
pub const C_PATTERN_CREATED_DATE: &str = r"Created: (.+)";
/// chrono format equivalent of `January 2, 2006 3:04 PM`.
pub const C_FORMAT_CREATED_DATE: &str = "%B %d, %Y %I:%M %p";
/// Month names accepted in a `Created:` value; abbreviations are rejected.
pub const C_MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
/// Meridiem markers accepted in a `Created:` value (upper case only).
pub const C_MERIDIEMS: [&str; 2] = ["AM", "PM"];
/// Number of leading content bytes searched for the `Created:` line.
pub const N_BYTES_CREATED_DATE_WINDOW: usize = 300;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `migrate_tree`.
#[derive(Debug, Clone)]
pub struct SpecMigrateOptions {
    /// Root of the exported note tree to read from.
    pub path_dir_import: PathBuf,
    /// Root of the destination tree.
    pub path_dir_export: PathBuf,
    /// Back-date destination mtimes from the `Created:` line.
    pub if_apply_created_date: bool,
    /// Maximum worker threads for the file stage. `Some(1)` keeps the run sequential.
    pub num_workers_max: Option<usize>,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl SpecMigrateOptions {
    /// Options with the default feature set for the given roots.
    pub fn new(path_dir_import: impl Into<PathBuf>, path_dir_export: impl Into<PathBuf>) -> Self {
        Self {
            path_dir_import: path_dir_import.into(),
            path_dir_export: path_dir_export.into(),
            if_apply_created_date: true,
            num_workers_max: Some(1),
            if_dry_run: false,
        }
    }
}

/// Compiled patterns shared by every file of one run.
#[derive(Debug, Clone)]
pub struct SpecMigratePatterns {
    /// Identifier token matcher, applied to path components.
    pub regex_identifier: Regex,
    /// `Created:` line matcher, applied to raw content bytes.
    pub regex_created_date: BytesRegex,
}

impl SpecMigratePatterns {
    /// Compile the built-in patterns.
    pub fn new() -> Result<Self, MigrateError> {
        let regex_identifier = Regex::new(C_PATTERN_IDENTIFIER)
            .map_err(|e| MigrateError::InvalidPattern(e.to_string()))?;
        let regex_created_date = BytesRegex::new(C_PATTERN_CREATED_DATE)
            .map_err(|e| MigrateError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            regex_identifier,
            regex_created_date,
        })
    }
}

/// One per-entry failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMigrateError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Why a `Created:` value does not match `January 2, 2006 3:04 PM`.
#[derive(Debug, Error)]
pub enum EnumCreatedDateError {
    /// Month is not spelled out in full.
    #[error("Month must be a full month name, got {0:?}")]
    MonthName(String),
    /// Meridiem is not `AM` or `PM`.
    #[error("Meridiem must be AM or PM, got {0:?}")]
    Meridiem(String),
    /// Remaining layout rejected by chrono.
    #[error(transparent)]
    Layout(#[from] chrono::ParseError),
}

/// Errors that abort a whole run.
///
/// Recoverable per-entry problems never surface here; they are collected in
/// [`crate::ReportMigrate`] instead.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Import or export root is empty.
    #[error("Both import and export paths should be non-empty")]
    EmptyRoot,
    /// Import root is missing or not a directory.
    #[error("Import path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Import and export roots overlap (one contains the other).
    #[error(
        "Import and export directories overlap: {} <-> {}",
        .path_dir_import.display(),
        .path_dir_export.display()
    )]
    SourceDestinationOverlap {
        /// Import root.
        path_dir_import: PathBuf,
        /// Export root.
        path_dir_export: PathBuf,
    },
    /// A built-in pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    /// Walked entry does not live under the import root.
    #[error("Path {} is not under import root {}", .path.display(), .root.display())]
    SourceOutsideImportRoot {
        /// Offending entry.
        path: PathBuf,
        /// Configured import root.
        root: PathBuf,
    },
    /// Destination directory could not be inspected.
    #[error("Failed to inspect directory {}: {source}", .path.display())]
    DirectoryInspectFailed {
        /// Directory being checked.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Destination directory path is occupied by a non-directory.
    #[error("Destination exists and is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Destination directory could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        /// Directory being created.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Destination file could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed {
        /// Destination file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A `Created:` line was found but its value does not parse.
    #[error("Failed to parse created date {text:?} in {}: {source}", .path.display())]
    CreatedDateParse {
        /// Source note.
        path: PathBuf,
        /// Captured text after `Created: `.
        text: String,
        /// Layout failure.
        source: EnumCreatedDateError,
    },
    /// Worker pool could not be built.
    #[error("Failed to initialize thread pool (workers={workers}): {message}")]
    ThreadPool {
        /// Requested worker count.
        workers: usize,
        /// Underlying rayon error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
