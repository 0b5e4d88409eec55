//! Classify scanned paths against the installed package manifests.
//!
//! Plain ownership is a set-membership check. Backup files additionally
//! compare the live content's MD5 with the checksum pacman recorded at
//! install time, and remember which package claimed them.
use crate::pacman::Package;
use crate::sysroot::SysRoot;
use crate::util::md5_hex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathStatus {
    NotOwned,
    Owned,
    BackupUnchanged,
    BackupChanged,
    BackupUnknown,
}

impl PathStatus {
    pub const ALL: [PathStatus; 5] = [
        PathStatus::NotOwned,
        PathStatus::Owned,
        PathStatus::BackupUnchanged,
        PathStatus::BackupChanged,
        PathStatus::BackupUnknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PathStatus::NotOwned => "NOT_OWNED",
            PathStatus::Owned => "OWNED",
            PathStatus::BackupUnchanged => "BACKUP_UNCHANGED",
            PathStatus::BackupChanged => "BACKUP_CHANGED",
            PathStatus::BackupUnknown => "BACKUP_UNKNOWN",
        }
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one path plus, for backup files, the package that claims it.
#[derive(Debug, Clone, Copy)]
pub struct PathRecord<'p> {
    pub status: PathStatus,
    pub owner: Option<&'p Package>,
}

/// Two packages listed the same backup path; `current` replaced `previous`.
#[derive(Debug, Clone)]
pub struct BackupConflict<'p> {
    pub path: PathBuf,
    pub previous: &'p Package,
    pub current: &'p Package,
}

#[derive(Debug, Default)]
pub struct Classification<'p> {
    records: BTreeMap<PathBuf, PathRecord<'p>>,
    conflicts: Vec<BackupConflict<'p>>,
}

impl<'p> Classification<'p> {
    pub fn get(&self, path: &Path) -> Option<&PathRecord<'p>> {
        self.records.get(path)
    }

    /// Records in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &PathRecord<'p>)> {
        self.records.iter().map(|(path, record)| (path.as_path(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn conflicts(&self) -> &[BackupConflict<'p>] {
        &self.conflicts
    }

    pub fn count(&self, status: PathStatus) -> usize {
        self.records
            .values()
            .filter(|record| record.status == status)
            .count()
    }
}

/// Classify every path in `paths` (system paths, absolute) against
/// `packages`, reading backup files through `root`.
///
/// Packages are processed in slice order and a later write for the same path
/// replaces an earlier one. A backup path claimed by two packages keeps the
/// later owner and is reported in [`Classification::conflicts`].
pub fn classify<'p, I, P>(paths: I, packages: &'p [Package], root: &SysRoot) -> Classification<'p>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut records: BTreeMap<PathBuf, PathRecord<'p>> = paths
        .into_iter()
        .map(|path| {
            (
                path.into(),
                PathRecord {
                    status: PathStatus::NotOwned,
                    owner: None,
                },
            )
        })
        .collect();
    let mut conflicts = Vec::new();

    for package in packages {
        for file in &package.owned_files {
            if let Some(record) = records.get_mut(&system_path(&file.path)) {
                record.status = PathStatus::Owned;
            }
        }
        for backup in &package.backup_files {
            let path = system_path(&backup.path);
            let Some(record) = records.get_mut(&path) else {
                continue;
            };
            if let Some(previous) = record.owner.filter(|prev| prev.name != package.name) {
                tracing::warn!(
                    path = %path.display(),
                    previous = %previous.name,
                    current = %package.name,
                    "backup file claimed by more than one package"
                );
                conflicts.push(BackupConflict {
                    path: path.clone(),
                    previous,
                    current: package,
                });
            }
            record.status = backup_status(root, &path, &backup.md5);
            record.owner = Some(package);
        }
    }

    Classification { records, conflicts }
}

fn backup_status(root: &SysRoot, path: &Path, reference_md5: &str) -> PathStatus {
    match fs::read(root.host_path(path)) {
        Ok(bytes) if md5_hex(&bytes).eq_ignore_ascii_case(reference_md5) => {
            PathStatus::BackupUnchanged
        }
        Ok(_) => PathStatus::BackupChanged,
        Err(err) => {
            tracing::debug!(path = %path.display(), "backup file unreadable: {err}");
            PathStatus::BackupUnknown
        }
    }
}

/// Database paths are relative (`etc/foo.conf`); scanned paths are absolute.
fn system_path(db_path: &str) -> PathBuf {
    Path::new("/").join(db_path.trim_start_matches('/'))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
