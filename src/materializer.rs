//! Writes merged results to disk and copies the shared project skeleton.
//! The merge engine itself never touches the filesystem; everything
//! here operates on an already-assembled `MergeResult`.

use crate::constants::IGNORE_FILE;
use crate::error::{Error, Result};
use crate::model::MergeResult;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensures the output directory is safe to write to.
///
/// # Errors
/// * `Error::OutputDirectoryExistsError` if it exists and `force` is false
pub fn ensure_output_dir<P: AsRef<Path>>(output_dir: P, force: bool) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    if output_dir.exists() && !force {
        return Err(Error::OutputDirectoryExistsError {
            output_dir: output_dir.display().to_string(),
        });
    }
    Ok(output_dir.to_path_buf())
}

fn write_file(content: &str, dest_path: &Path) -> Result<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(Error::IoError)?;
    }
    fs::write(dest_path, content).map_err(Error::IoError)
}

fn copy_file(source_path: &Path, dest_path: &Path) -> Result<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(Error::IoError)?;
    }
    fs::copy(source_path, dest_path).map(|_| ()).map_err(Error::IoError)
}

/// Compiles the skeleton's `.forgeignore` patterns, if present, together
/// with the default exclusions.
pub fn skeleton_patterns(skeleton_dir: &Path) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["**/.DS_Store", ".git/**"] {
        builder.add(Glob::new(pattern).map_err(|e| Error::TemplateError(e.to_string()))?);
    }
    let ignore_path = skeleton_dir.join(IGNORE_FILE);
    if let Ok(contents) = fs::read_to_string(&ignore_path) {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            builder.add(Glob::new(line).map_err(|e| {
                Error::TemplateError(format!("{} loading failed: {}", IGNORE_FILE, e))
            })?);
        }
    } else {
        debug!("{} does not exist", IGNORE_FILE);
    }
    builder.build().map_err(|e| Error::TemplateError(e.to_string()))
}

/// Writes every merged file under `output_dir`, then copies the shared
/// skeleton around them. Returns the paths written, in order.
///
/// Skeleton files never overwrite merged output, and `dry_run` suppresses
/// every write while still reporting what would be produced.
///
/// # Errors
/// * `Error::MergeRefused` when handed an unsuccessful result
pub fn materialize(
    result: &MergeResult,
    output_dir: &Path,
    skeleton_dir: Option<&Path>,
    dry_run: bool,
) -> Result<Vec<PathBuf>> {
    if !result.success {
        return Err(Error::MergeRefused { error_count: result.report.errors.len() });
    }

    let mut written = Vec::new();
    for (rel, content) in &result.files {
        let dest = output_dir.join(rel);
        if dry_run {
            debug!("Dry run, skipping write of {}", dest.display());
        } else {
            write_file(content, &dest)?;
        }
        written.push(dest);
    }

    if let Some(skeleton_dir) = skeleton_dir {
        if skeleton_dir.is_dir() {
            let patterns = skeleton_patterns(skeleton_dir)?;
            for entry in WalkDir::new(skeleton_dir).sort_by_file_name() {
                let entry = entry.map_err(|e| Error::TemplateError(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(skeleton_dir)
                    .map_err(|e| Error::TemplateError(e.to_string()))?;
                let rel_str = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
                if rel_str == IGNORE_FILE || patterns.is_match(&rel_str) {
                    debug!("Skipping skeleton file {}", rel_str);
                    continue;
                }
                if result.files.contains_key(&rel_str) {
                    continue;
                }
                let dest = output_dir.join(rel);
                if dry_run {
                    debug!("Dry run, skipping copy of {}", dest.display());
                } else {
                    copy_file(entry.path(), &dest)?;
                }
                written.push(dest);
            }
        }
    }

    Ok(written)
}
