//! Mapping between system paths and the host paths they live at.
//!
//! Everything the audit reports is a system path (`/etc/foo.conf`). When the
//! audited system is mounted somewhere else, reads go through [`SysRoot`].
use crate::util::strip_root;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysRoot {
    root: PathBuf,
}

impl SysRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `system_path` lives on the host.
    pub fn host_path(&self, system_path: &Path) -> PathBuf {
        self.root.join(strip_root(system_path))
    }

    /// Inverse of [`SysRoot::host_path`]; `None` for paths outside the root.
    pub fn system_path(&self, host_path: &Path) -> Option<PathBuf> {
        host_path
            .strip_prefix(&self.root)
            .ok()
            .map(|rel| Path::new("/").join(rel))
    }
}

impl Default for SysRoot {
    fn default() -> Self {
        Self::new("/")
    }
}
