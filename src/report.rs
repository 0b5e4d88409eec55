//! Machine-readable record of one `--etc` run.
use crate::backup::BackupSummary;
use crate::status::{Classification, PathStatus};
use crate::util::write_atomic;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct PathEntry {
    pub path: PathBuf,
    pub status: PathStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConflictEntry {
    pub path: PathBuf,
    pub previous: String,
    pub current: String,
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub summary: BackupSummary,
    pub paths: Vec<PathEntry>,
    pub conflicts: Vec<ConflictEntry>,
}

impl AuditReport {
    pub fn new(classification: &Classification<'_>, summary: &BackupSummary) -> Self {
        let paths = classification
            .iter()
            .map(|(path, record)| PathEntry {
                path: path.to_path_buf(),
                status: record.status,
                owner: record
                    .owner
                    .map(|pkg| format!("{} {}", pkg.name, pkg.version)),
            })
            .collect();
        let conflicts = classification
            .conflicts()
            .iter()
            .map(|conflict| ConflictEntry {
                path: conflict.path.clone(),
                previous: conflict.previous.name.clone(),
                current: conflict.current.name.clone(),
            })
            .collect();
        Self {
            summary: summary.clone(),
            paths,
            conflicts,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("serialize audit report")?;
        write_atomic(path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::classify;
    use crate::sysroot::SysRoot;
    use crate::test_support::package_with;

    #[test]
    fn report_lists_every_path_with_owner_for_backups() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = SysRoot::new(temp.path());
        let packages = vec![package_with("bar", "1.0-1", &[], &[("etc/foo.conf", b"x")])];
        let classification = classify(["/etc/foo.conf", "/etc/extra"], &packages, &root);
        let report = AuditReport::new(&classification, &BackupSummary::default());

        let out = temp.path().join("report.json");
        report.write(&out).expect("write report");
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&out).expect("read report")).expect("parse");

        let paths = value["paths"].as_array().expect("paths array");
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0]["path"], "/etc/extra");
        assert_eq!(paths[0]["status"], "NOT_OWNED");
        assert!(paths[0].get("owner").is_none());
        assert_eq!(paths[1]["path"], "/etc/foo.conf");
        assert_eq!(paths[1]["status"], "BACKUP_UNKNOWN");
        assert_eq!(paths[1]["owner"], "bar 1.0-1");
        assert_eq!(value["summary"]["failures"], 0);
        assert!(value["conflicts"].as_array().expect("conflicts").is_empty());
    }
}
