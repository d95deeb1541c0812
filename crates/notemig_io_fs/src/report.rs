//! Migration report models and mutable report builder.

use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecMigrateError;

/// Aggregate counters and diagnostics for one `migrate_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportMigrate {
    /// Total walked file entries (directories excluded).
    pub cnt_scanned: u64,
    /// Number of scanned files accepted by the path filter.
    pub cnt_matched: u64,
    /// Number of notes written to the export tree.
    pub cnt_copied: u64,
    /// Number of matched notes not written (unreadable source or dry-run).
    pub cnt_skipped: u64,
    /// Number of copied notes whose mtime came from a `Created:` line.
    pub cnt_dated: u64,
    /// Non-fatal warnings collected during traversal/copy.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecMigrateError>,
}

impl ReportMigrate {
    /// Number of collected per-entry errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} matched={} copied={} skipped={} dated={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_matched,
            self.cnt_copied,
            self.cnt_skipped,
            self.cnt_dated,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportMigrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MIGRATE]"))
    }
}

/// Mutable accumulator for migration statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportMigrateBuilder {
    report: ReportMigrate,
}

impl ReportMigrateBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    /// Increment matched count by one.
    pub fn add_matched(&mut self) {
        self.report.cnt_matched += 1;
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    /// Increment dated count by one.
    pub fn add_dated(&mut self) {
        self.report.cnt_dated += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.report.errors.push(SpecMigrateError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportMigrate {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportMigrate, ReportMigrateBuilder};

    #[test]
    fn report_migrate_format_and_display_agree() {
        let report = ReportMigrate {
            cnt_scanned: 8,
            cnt_matched: 5,
            cnt_copied: 3,
            cnt_skipped: 2,
            cnt_dated: 1,
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 1);

        let txt = report.format("[MIGRATE]");
        assert_eq!(
            txt,
            "[MIGRATE] scanned=8 matched=5 copied=3 skipped=2 dated=1 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_accumulates_errors_with_paths() {
        let mut builder = ReportMigrateBuilder::default();
        builder.add_scanned();
        builder.add_matched();
        builder.add_skipped();
        builder.add_error(PathBuf::from("notes/a.md"), "denied".to_string());

        let report = builder.build();
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, PathBuf::from("notes/a.md"));
        assert_eq!(report.errors[0].exception, "denied");
    }
}
