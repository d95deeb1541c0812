//! Note tree traversal and migration orchestration.

use std::fs;
use std::path::PathBuf;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::date::{apply_created_date, derive_created_date};
use crate::report::{ReportMigrate, ReportMigrateBuilder};
use crate::spec::{MigrateError, SpecMigrateOptions, SpecMigratePatterns};
use crate::util::{
    calculate_worker_limit, derive_destination_path, ensure_dir, is_dir_pruned, is_overlap,
    is_path_included, write_note,
};

#[derive(Debug, Clone)]
struct SpecMigrateTaskFile {
    path_file_src: PathBuf,
    path_file_dst: PathBuf,
}

/// Read-only state shared by every file task.
#[derive(Debug)]
struct SpecMigrateShared {
    spec_mg_pats: SpecMigratePatterns,
    if_apply_created_date: bool,
}

#[derive(Debug)]
enum EnumFileOutcome {
    Copied {
        if_dated: bool,
        warning: Option<String>,
    },
    Unreadable(String),
}

#[derive(Debug)]
struct SpecMigrateContext {
    spec_mg_options: SpecMigrateOptions,
    spec_mg_shared: SpecMigrateShared,
    n_workers_max: usize,
    builder_mg_report: ReportMigrateBuilder,
    l_tasks_file: Vec<SpecMigrateTaskFile>,
}

/// Migrate the note tree under `import` into `export`.
///
/// For every `.md` file outside `Untitled Database` paths this:
/// 1. strips identifier tokens and re-roots the path under the export root,
/// 2. creates missing parent directories,
/// 3. copies the bytes,
/// 4. back-dates the copy from its `Created:` line (unless disabled).
///
/// Unreadable entries are recorded in the returned [`ReportMigrate`] and the
/// run continues. Directory creation, write, and created-date parse failures
/// abort the run with [`MigrateError`]; files already written stay in place.
pub fn migrate_tree(spec_mg_options: SpecMigrateOptions) -> Result<ReportMigrate, MigrateError> {
    if spec_mg_options.path_dir_import.as_os_str().is_empty()
        || spec_mg_options.path_dir_export.as_os_str().is_empty()
    {
        return Err(MigrateError::EmptyRoot);
    }
    if !spec_mg_options.path_dir_import.is_dir() {
        return Err(MigrateError::SourceNotDirectory(
            spec_mg_options.path_dir_import.clone(),
        ));
    }
    if is_overlap(
        &spec_mg_options.path_dir_import,
        &spec_mg_options.path_dir_export,
    ) {
        return Err(MigrateError::SourceDestinationOverlap {
            path_dir_import: spec_mg_options.path_dir_import.clone(),
            path_dir_export: spec_mg_options.path_dir_export.clone(),
        });
    }
    if !spec_mg_options.if_dry_run {
        ensure_dir(&spec_mg_options.path_dir_export)?;
    }

    let spec_mg_shared = SpecMigrateShared {
        spec_mg_pats: SpecMigratePatterns::new()?,
        if_apply_created_date: spec_mg_options.if_apply_created_date,
    };
    let n_workers_max = calculate_worker_limit(spec_mg_options.num_workers_max);

    let mut spec_mg_ctx = SpecMigrateContext {
        spec_mg_options,
        spec_mg_shared,
        n_workers_max,
        builder_mg_report: ReportMigrateBuilder::default(),
        l_tasks_file: Vec::new(),
    };

    walk_import_tree(&mut spec_mg_ctx)?;
    flush_file_tasks(&mut spec_mg_ctx)?;

    let report_mg = spec_mg_ctx.builder_mg_report.build();
    info!("{report_mg}");
    Ok(report_mg)
}

fn walk_import_tree(spec_mg_ctx: &mut SpecMigrateContext) -> Result<(), MigrateError> {
    let path_dir_import = spec_mg_ctx.spec_mg_options.path_dir_import.clone();
    let iter_entries = WalkDir::new(&path_dir_import)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && is_dir_pruned(entry.path())));

    for res_entry in iter_entries {
        let entry = match res_entry {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to walk entry: {e}");
                spec_mg_ctx
                    .builder_mg_report
                    .add_warning(format!("Failed to walk entry ({e})"));
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        handle_file_entry(entry.into_path(), spec_mg_ctx)?;
    }
    Ok(())
}

fn handle_file_entry(
    path_file_src: PathBuf,
    spec_mg_ctx: &mut SpecMigrateContext,
) -> Result<(), MigrateError> {
    spec_mg_ctx.builder_mg_report.add_scanned();
    if !is_path_included(&path_file_src) {
        return Ok(());
    }
    spec_mg_ctx.builder_mg_report.add_matched();

    let path_file_dst = derive_destination_path(
        &path_file_src,
        &spec_mg_ctx.spec_mg_options.path_dir_import,
        &spec_mg_ctx.spec_mg_options.path_dir_export,
        &spec_mg_ctx.spec_mg_shared.spec_mg_pats.regex_identifier,
    )?;

    if spec_mg_ctx.spec_mg_options.if_dry_run {
        info!(
            "[DRY-RUN] {} -> {}",
            path_file_src.display(),
            path_file_dst.display()
        );
        spec_mg_ctx.builder_mg_report.add_skipped();
        return Ok(());
    }

    let spec_task = SpecMigrateTaskFile {
        path_file_src,
        path_file_dst,
    };
    if spec_mg_ctx.n_workers_max <= 1 {
        let enum_outcome = migrate_file(&spec_task, &spec_mg_ctx.spec_mg_shared)?;
        apply_outcome(spec_task, enum_outcome, &mut spec_mg_ctx.builder_mg_report);
        return Ok(());
    }
    spec_mg_ctx.l_tasks_file.push(spec_task);
    Ok(())
}

fn flush_file_tasks(spec_mg_ctx: &mut SpecMigrateContext) -> Result<(), MigrateError> {
    let l_tasks_file = std::mem::take(&mut spec_mg_ctx.l_tasks_file);
    if l_tasks_file.is_empty() {
        return Ok(());
    }

    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(spec_mg_ctx.n_workers_max)
        .build()
        .map_err(|e| MigrateError::ThreadPool {
            workers: spec_mg_ctx.n_workers_max,
            message: e.to_string(),
        })?;

    let spec_mg_shared = &spec_mg_ctx.spec_mg_shared;
    let l_outcomes = thread_pool.install(|| {
        l_tasks_file
            .into_par_iter()
            .map(|spec_task| {
                migrate_file(&spec_task, spec_mg_shared).map(|v| (spec_task, v))
            })
            .collect::<Result<Vec<_>, MigrateError>>()
    })?;

    for (spec_task, enum_outcome) in l_outcomes {
        apply_outcome(spec_task, enum_outcome, &mut spec_mg_ctx.builder_mg_report);
    }
    Ok(())
}

/// Process one note: read, materialize parent, write, back-date.
fn migrate_file(
    spec_task: &SpecMigrateTaskFile,
    spec_mg_shared: &SpecMigrateShared,
) -> Result<EnumFileOutcome, MigrateError> {
    let content = match fs::read(&spec_task.path_file_src) {
        Ok(v) => v,
        Err(e) => return Ok(EnumFileOutcome::Unreadable(e.to_string())),
    };

    if let Some(path_parent_dst) = spec_task.path_file_dst.parent() {
        ensure_dir(path_parent_dst)?;
    }
    write_note(&spec_task.path_file_dst, &content)?;
    debug!(
        "Copied {} -> {}",
        spec_task.path_file_src.display(),
        spec_task.path_file_dst.display()
    );

    if !spec_mg_shared.if_apply_created_date {
        return Ok(EnumFileOutcome::Copied {
            if_dated: false,
            warning: None,
        });
    }

    let date_created = derive_created_date(
        &spec_task.path_file_src,
        &content,
        &spec_mg_shared.spec_mg_pats.regex_created_date,
    )?;
    let warning = apply_created_date(&spec_task.path_file_dst, &date_created)
        .err()
        .map(|e| {
            format!(
                "Failed to set times on {} ({e})",
                spec_task.path_file_dst.display()
            )
        });
    Ok(EnumFileOutcome::Copied {
        if_dated: date_created.is_parsed(),
        warning,
    })
}

fn apply_outcome(
    spec_task: SpecMigrateTaskFile,
    enum_outcome: EnumFileOutcome,
    builder_mg_report: &mut ReportMigrateBuilder,
) {
    match enum_outcome {
        EnumFileOutcome::Copied { if_dated, warning } => {
            builder_mg_report.add_copied();
            if if_dated {
                builder_mg_report.add_dated();
            }
            if let Some(warning) = warning {
                warn!("{warning}");
                builder_mg_report.add_warning(warning);
            }
        }
        EnumFileOutcome::Unreadable(message) => {
            warn!(
                "Failed to read {} ({message})",
                spec_task.path_file_src.display()
            );
            builder_mg_report.add_skipped();
            builder_mg_report.add_error(spec_task.path_file_src, message);
        }
    }
}
