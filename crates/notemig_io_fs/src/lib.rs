//! `notemig_io_fs` v1:
//! Rust-side note tree migration engine.
//!
//! - `migrate` : traversal and per-note orchestration
//! - `date`    : `Created:` line extraction and mtime application
//! - `spec`    : constants/options/errors
//! - `report`  : run-time report model
//! - `util`    : path filter, path transform, directory and file helpers

pub mod date;
pub mod migrate;
pub mod report;
pub mod spec;
mod util;

#[cfg(test)]
mod test_util;

pub use date::{EnumCreatedDate, derive_created_date, parse_created_date};
pub use migrate::migrate_tree;
pub use report::{ReportMigrate, ReportMigrateBuilder};
pub use spec::{
    EnumCreatedDateError, MigrateError, SpecMigrateError, SpecMigrateOptions, SpecMigratePatterns,
};
pub use util::{derive_destination_path, ensure_dir, is_path_included, strip_identifier_tokens};
