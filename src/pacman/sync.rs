//! Sync database loader (`<DBPath>/sync/<repo>.db`).
//!
//! A sync database is a compressed tar of `<name>-<version>/desc` entries;
//! only name, version, and archive filename are kept.
use super::desc::Sections;
use crate::archive::open_tar;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub name: String,
    pub version: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncDb {
    name: String,
    entries: HashMap<String, SyncEntry>,
}

impl SyncDb {
    pub fn from_entries(name: impl Into<String>, entries: impl IntoIterator<Item = SyncEntry>) -> Self {
        Self {
            name: name.into(),
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }

    /// Read `<db_path>/sync/<repo>.db`. A repository that was never synced
    /// has no file; that yields an empty database rather than an error.
    pub fn load(db_path: &Path, repo: &str) -> Result<Self> {
        let path = db_path.join("sync").join(format!("{repo}.db"));
        if !path.is_file() {
            tracing::warn!(repo, path = %path.display(), "sync database missing");
            return Ok(Self::from_entries(repo, Vec::new()));
        }
        let mut tar = open_tar(&path)?;
        let mut entries = Vec::new();
        for entry in tar
            .entries()
            .with_context(|| format!("read sync db {}", path.display()))?
        {
            let mut entry = entry.with_context(|| format!("read sync db {}", path.display()))?;
            let member = entry
                .path()
                .context("read sync db member name")?
                .to_string_lossy()
                .into_owned();
            if !member.ends_with("/desc") {
                continue;
            }
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .with_context(|| format!("read {member} in {}", path.display()))?;
            let desc = Sections::parse(&text);
            let (Some(name), Some(version)) = (desc.first("NAME"), desc.first("VERSION")) else {
                tracing::warn!(repo, member = %member, "sync entry without name or version");
                continue;
            };
            entries.push(SyncEntry {
                name: name.to_string(),
                version: version.to_string(),
                filename: desc.first("FILENAME").map(str::to_string),
            });
        }
        tracing::debug!(repo, count = entries.len(), "loaded sync database");
        Ok(Self::from_entries(repo, entries))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&SyncEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
