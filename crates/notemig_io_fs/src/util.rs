use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::spec::{C_MARKER_UNTITLED_DATABASE, C_SUFFIX_NOTE, MigrateError};

////////////////////////////////////////////////////////////////////////////////
// #region PathFilter

/// Whether a walked file is a note that should be migrated.
///
/// Rules, in order: the path must not contain the `Untitled Database` marker,
/// and the file name must end with `.md` (case-sensitive).
pub fn is_path_included(path: &Path) -> bool {
    if path
        .to_string_lossy()
        .contains(C_MARKER_UNTITLED_DATABASE)
    {
        return false;
    }
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(C_SUFFIX_NOTE))
}

/// Whether recursion into a directory can be skipped entirely.
///
/// Only the marker rule prunes; the suffix rule never applies to directories.
pub(crate) fn is_dir_pruned(path_dir: &Path) -> bool {
    path_dir
        .to_string_lossy()
        .contains(C_MARKER_UNTITLED_DATABASE)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathTransform

/// Remove every identifier token (`<whitespace><32 hex>`) from `value`.
pub fn strip_identifier_tokens<'a>(value: &'a str, regex_identifier: &Regex) -> Cow<'a, str> {
    regex_identifier.replace_all(value, "")
}

/// Derive the export path of a note.
///
/// The source path is made relative to `path_dir_import`, identifier tokens are
/// stripped from each remaining component, and the result is joined onto
/// `path_dir_export`. Components that become empty are dropped.
///
/// # Examples
/// ```ignore
/// let pats = SpecMigratePatterns::new()?;
/// let path_dst = derive_destination_path(
///     Path::new("notes/Idea 1a2b3c4d5e6f7890a1b2c3d4e5f67890.md"),
///     Path::new("notes"),
///     Path::new("out"),
///     &pats.regex_identifier,
/// )?;
/// assert_eq!(path_dst, Path::new("out/Idea.md"));
/// ```
pub fn derive_destination_path(
    path_src: &Path,
    path_dir_import: &Path,
    path_dir_export: &Path,
    regex_identifier: &Regex,
) -> Result<PathBuf, MigrateError> {
    let path_rel = path_src.strip_prefix(path_dir_import).map_err(|_| {
        MigrateError::SourceOutsideImportRoot {
            path: path_src.to_path_buf(),
            root: path_dir_import.to_path_buf(),
        }
    })?;

    let mut path_dst = path_dir_export.to_path_buf();
    for part_rel in path_rel.components() {
        match part_rel {
            Component::Normal(name) => match name.to_str() {
                Some(c_name) => {
                    let c_name_stripped = strip_identifier_tokens(c_name, regex_identifier);
                    if !c_name_stripped.is_empty() {
                        path_dst.push(c_name_stripped.as_ref());
                    }
                }
                None => path_dst.push(name),
            },
            other => path_dst.push(other.as_os_str()),
        }
    }
    Ok(path_dst)
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Materialize

/// Make sure `path_dir` exists as a directory.
///
/// Only a `NotFound` answer leads to creation (recursive, mode `0o777` before
/// umask). Other inspection errors and non-directory occupants are reported as
/// distinct errors. Concurrent creation of the same directory is not an error.
pub fn ensure_dir(path_dir: &Path) -> Result<(), MigrateError> {
    match fs::metadata(path_dir) {
        Ok(meta_dir) if meta_dir.is_dir() => Ok(()),
        Ok(_) => Err(MigrateError::NotADirectory(path_dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            create_dir_permissive(path_dir).map_err(|e| MigrateError::DirectoryCreateFailed {
                path: path_dir.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(MigrateError::DirectoryInspectFailed {
            path: path_dir.to_path_buf(),
            source: e,
        }),
    }
}

fn create_dir_permissive(path_dir: &Path) -> Result<(), io::Error> {
    let mut dir_builder = fs::DirBuilder::new();
    dir_builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        dir_builder.mode(0o777);
    }
    dir_builder.create(path_dir)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Copy

/// Write `content` to `path_file_dst`, replacing any existing file.
///
/// New files get mode `0o666` before umask.
pub fn write_note(path_file_dst: &Path, content: &[u8]) -> Result<(), MigrateError> {
    _write_permissive(path_file_dst, content).map_err(|e| MigrateError::WriteFailed {
        path: path_file_dst.to_path_buf(),
        source: e,
    })
}

fn _write_permissive(path_file_dst: &Path, content: &[u8]) -> Result<(), io::Error> {
    let mut open_options = fs::OpenOptions::new();
    open_options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open_options.mode(0o666);
    }
    let mut file_dst = open_options.open(path_file_dst)?;
    file_dst.write_all(content)?;
    file_dst.flush()
}

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
