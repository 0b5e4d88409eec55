//! Read-only view of the pacman package databases.
//!
//! The audit only needs a small slice of what libalpm tracks: package
//! identity, the file and backup manifests, groups, packager, and install
//! reason from the local database, plus the archive filename of each package
//! in the sync databases.
mod conf;
mod desc;
mod local;
mod sync;

pub use conf::{PacmanConf, DEFAULT_CACHE_DIR, DEFAULT_DB_PATH};
pub use local::load_local_packages;
pub use sync::{SyncDb, SyncEntry};

use serde::Serialize;

/// Packager string makepkg writes when `PACKAGER` is unset.
pub const UNKNOWN_PACKAGER: &str = "Unknown Packager";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallReason {
    Explicit,
    Dependency,
}

/// One entry of a package's file manifest. Paths are relative to `/`.
///
/// `size` and `mode` are zero when the database does not record them, which
/// is always the case for the local database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFile {
    pub path: String,
    pub size: u64,
    pub mode: u32,
}

/// A file the packager marked as user-editable, with the MD5 of the
/// pristine version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: String,
    pub md5: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub owned_files: Vec<OwnedFile>,
    pub backup_files: Vec<BackupFile>,
    pub groups: Vec<String>,
    pub packager: String,
    pub reason: InstallReason,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            owned_files: Vec::new(),
            backup_files: Vec::new(),
            groups: Vec::new(),
            packager: String::new(),
            reason: InstallReason::Explicit,
        }
    }

    pub fn identity(&self) -> (&str, &str) {
        (&self.name, &self.version)
    }

    pub fn is_explicit(&self) -> bool {
        self.reason == InstallReason::Explicit
    }

    /// True when the package was not built by a known packager, which in
    /// practice means it came from the AUR or a local build.
    pub fn has_unknown_packager(&self) -> bool {
        let packager = self.packager.trim();
        packager.is_empty() || packager == UNKNOWN_PACKAGER
    }
}

/// Packages installed on request rather than as dependencies, in database
/// order.
pub fn explicitly_installed(packages: &[Package]) -> Vec<&Package> {
    packages.iter().filter(|pkg| pkg.is_explicit()).collect()
}
