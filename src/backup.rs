//! The `--etc` flow: walk, classify, copy, diff.
//!
//! Untracked files and modified backup files are copied under the output
//! directory at their system path (`/etc/foo` → `<out>/etc/foo`). Modified
//! files also get `<out>/etc/foo.diff` when the pristine version can be
//! recovered from the package cache. Per-path failures are logged and
//! counted; they never stop the rest of the run.
use crate::cache::RunCache;
use crate::diff::{diff, diff_labels};
use crate::history::HistoryResolver;
use crate::pacman::Package;
use crate::status::{classify, Classification, PathStatus};
use crate::sysroot::SysRoot;
use crate::util::{strip_root, write_bytes};
use crate::walk::{walk_files, IgnoreFilter};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

/// Inputs of one `--etc` run.
pub struct BackupContext<'a> {
    pub root: &'a SysRoot,
    pub output_dir: &'a Path,
    /// Absolute system path of the directory to audit, usually `/etc`.
    pub scan_dir: &'a Path,
    pub packages: &'a [Package],
    pub history: HistoryResolver<'a>,
    pub ignore: &'a IgnoreFilter,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    pub scanned: usize,
    pub ignored: usize,
    pub untracked: usize,
    pub modified: usize,
    pub diffs_written: usize,
    pub diffs_unavailable: usize,
    pub failures: usize,
}

/// Why no diff was written for a modified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutcome {
    Written,
    NoPristineCopy,
    Binary,
}

pub fn backup_etc<'p>(
    ctx: &BackupContext<'p>,
    cache: &mut RunCache,
) -> Result<(Classification<'p>, BackupSummary)> {
    let local_scan = ctx.output_dir.join(strip_root(ctx.scan_dir));
    let host_scan = ctx.root.host_path(ctx.scan_dir);
    ensure_disjoint(&local_scan, &host_scan)?;
    match fs::remove_dir_all(&local_scan) {
        Ok(()) => tracing::debug!(dir = %local_scan.display(), "cleared previous backup"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("clear {}", local_scan.display()));
        }
    }

    let mut summary = BackupSummary::default();
    let mut paths = Vec::new();
    for host_path in walk_files(&host_scan) {
        let Some(path) = ctx.root.system_path(&host_path) else {
            continue;
        };
        if ctx.ignore.is_ignored(&path, false) {
            summary.ignored += 1;
            continue;
        }
        paths.push(path);
    }
    summary.scanned = paths.len();
    tracing::info!(scanned = summary.scanned, ignored = summary.ignored, "walked {}", ctx.scan_dir.display());

    let classification = classify(paths, ctx.packages, ctx.root);
    for (path, record) in classification.iter() {
        let label = match record.status {
            PathStatus::NotOwned => "untracked",
            PathStatus::BackupChanged => "modified",
            _ => continue,
        };
        if let Err(err) = copy_path_to_local(ctx.root, path, ctx.output_dir, label) {
            tracing::warn!(path = %path.display(), "copy failed: {err:#}");
            summary.failures += 1;
            continue;
        }
        if record.status == PathStatus::NotOwned {
            summary.untracked += 1;
            continue;
        }
        summary.modified += 1;
        let Some(owner) = record.owner else {
            continue;
        };
        match write_diff(ctx, cache, owner, path) {
            Ok(DiffOutcome::Written) => summary.diffs_written += 1,
            Ok(outcome) => {
                tracing::debug!(path = %path.display(), ?outcome, "no diff written");
                summary.diffs_unavailable += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), package = %owner.name, "diff failed: {err:#}");
                summary.failures += 1;
            }
        }
    }
    Ok((classification, summary))
}

/// The backup copy of the scan directory is cleared before every run, so it
/// must not be, contain, or sit inside the directory being scanned.
fn ensure_disjoint(local_scan: &Path, host_scan: &Path) -> Result<()> {
    let local = resolve_existing(local_scan)?;
    let host = resolve_existing(host_scan)?;
    if local.starts_with(&host) || host.starts_with(&local) {
        bail!(
            "backup target {} overlaps scanned directory {}",
            local.display(),
            host.display()
        );
    }
    Ok(())
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// missing components, so not-yet-created outputs still compare correctly.
fn resolve_existing(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(canonical) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(canonical, |acc: PathBuf, part| acc.join(part)));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(err).with_context(|| format!("resolve {}", path.display()));
                };
                missing.push(name);
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            Err(err) => return Err(err).with_context(|| format!("resolve {}", path.display())),
        }
    }
}

/// Copy the system path `path` to `<output_dir>/<path>`. Symlinks are copied
/// as symlinks; regular files keep their permission bits.
pub fn copy_path_to_local(
    root: &SysRoot,
    path: &Path,
    output_dir: &Path,
    label: &str,
) -> Result<PathBuf> {
    let source = root.host_path(path);
    let dest = output_dir.join(strip_root(path));
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    println!("Copying {label:<9} {}", path.display());
    let meta =
        fs::symlink_metadata(&source).with_context(|| format!("stat {}", source.display()))?;
    if meta.file_type().is_symlink() {
        let target =
            fs::read_link(&source).with_context(|| format!("read link {}", source.display()))?;
        match fs::remove_file(&dest) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err).with_context(|| format!("replace {}", dest.display())),
        }
        symlink(&target, &dest).with_context(|| format!("link {}", dest.display()))?;
    } else {
        fs::copy(&source, &dest)
            .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
    }
    Ok(dest)
}

/// Write `<output_dir>/<path>.diff` comparing the pristine version shipped by
/// `owner` with the live file.
pub fn write_diff(
    ctx: &BackupContext<'_>,
    cache: &mut RunCache,
    owner: &Package,
    path: &Path,
) -> Result<DiffOutcome> {
    let current = fs::read(ctx.root.host_path(path))
        .with_context(|| format!("read {}", path.display()))?;
    let Some(pristine) = ctx.history.resolve(cache, owner, path)? else {
        return Ok(DiffOutcome::NoPristineCopy);
    };
    let (from_label, to_label) = diff_labels(owner, path);
    let Some(file_diff) = diff(&pristine, &current, &from_label, &to_label) else {
        return Ok(DiffOutcome::Binary);
    };
    let diff_rel = format!("{}.diff", strip_root(path).display());
    println!(" Writing diff to {diff_rel}");
    write_bytes(&ctx.output_dir.join(&diff_rel), file_diff.to_text().as_bytes())?;
    Ok(DiffOutcome::Written)
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
