//! Recover the install-time content of a file from the package cache.
//!
//! The sync databases map an installed package to the archive filename it
//! was downloaded as; the cache directories are probed for that file. Old
//! archives get pruned from the cache routinely, so "not found" is a normal
//! answer here, not an error.
use crate::archive;
use crate::cache::RunCache;
use crate::pacman::{Package, SyncDb};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct HistoryResolver<'a> {
    sync_dbs: &'a [SyncDb],
    cache_dirs: &'a [PathBuf],
}

impl<'a> HistoryResolver<'a> {
    pub fn new(sync_dbs: &'a [SyncDb], cache_dirs: &'a [PathBuf]) -> Self {
        Self {
            sync_dbs,
            cache_dirs,
        }
    }

    /// Cached archives that were built from exactly `package`, in sync
    /// database order and then cache directory order.
    pub fn candidate_archives(&self, package: &Package) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for db in self.sync_dbs {
            let Some(entry) = db.get(&package.name) else {
                continue;
            };
            if entry.version != package.version {
                tracing::debug!(
                    repo = db.name(),
                    package = %package.name,
                    installed = %package.version,
                    available = %entry.version,
                    "sync version differs from installed"
                );
                continue;
            }
            let Some(filename) = entry.filename.as_deref().filter(|f| is_plain_filename(f)) else {
                continue;
            };
            for dir in self.cache_dirs {
                let candidate = dir.join(filename);
                if candidate.is_file() {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    /// Bytes `path` had when `package` was installed, if a cached archive
    /// still holds them. A readable archive that lacks the member is skipped;
    /// an archive that cannot be decoded fails this lookup.
    pub fn resolve(
        &self,
        cache: &mut RunCache,
        package: &Package,
        path: &Path,
    ) -> Result<Option<Vec<u8>>> {
        assert!(
            path.is_absolute(),
            "historical lookup needs an absolute path, got {}",
            path.display()
        );
        let member = path.to_string_lossy();
        for archive_path in self.candidate_archives(package) {
            if let Some(bytes) = archive::extract(cache, &archive_path, &member)? {
                tracing::debug!(archive = %archive_path.display(), path = %path.display(), "found pristine copy");
                return Ok(Some(bytes));
            }
            tracing::debug!(archive = %archive_path.display(), path = %path.display(), "member not in archive");
        }
        Ok(None)
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|f| f.to_str()) == Some(name)
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
