//! Local database loader (`<DBPath>/local/<name>-<version>/`).
use super::desc::Sections;
use super::{BackupFile, InstallReason, OwnedFile, Package};
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;

/// Load every installed package, sorted by name so later stages see a
/// stable order. Entries that fail to parse are skipped with a warning.
pub fn load_local_packages(db_path: &Path) -> Result<Vec<Package>> {
    let local_dir = db_path.join("local");
    let entries = fs::read_dir(&local_dir)
        .with_context(|| format!("read local db {}", local_dir.display()))?;
    let mut packages = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read local db {}", local_dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match load_entry(&path) {
            Ok(package) => packages.push(package),
            Err(err) => tracing::warn!(entry = %path.display(), "skipping local db entry: {err:#}"),
        }
    }
    packages.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));
    tracing::debug!(count = packages.len(), "loaded local packages");
    Ok(packages)
}

fn load_entry(dir: &Path) -> Result<Package> {
    let desc_path = dir.join("desc");
    let desc =
        fs::read_to_string(&desc_path).with_context(|| format!("read {}", desc_path.display()))?;
    let mut package = package_from_desc(&Sections::parse(&desc))?;

    let files_path = dir.join("files");
    if files_path.is_file() {
        let files = fs::read_to_string(&files_path)
            .with_context(|| format!("read {}", files_path.display()))?;
        apply_files(&mut package, &Sections::parse(&files))?;
    }
    Ok(package)
}

fn package_from_desc(desc: &Sections) -> Result<Package> {
    let name = desc.first("NAME").ok_or_else(|| anyhow!("desc has no %NAME%"))?;
    let version = desc
        .first("VERSION")
        .ok_or_else(|| anyhow!("desc for {name} has no %VERSION%"))?;
    let mut package = Package::new(name, version);
    package.groups = desc.all("GROUPS").to_vec();
    package.packager = desc.first("PACKAGER").unwrap_or_default().to_string();
    package.reason = match desc.first("REASON") {
        None | Some("0") => InstallReason::Explicit,
        Some("1") => InstallReason::Dependency,
        Some(other) => bail!("unknown install reason {other:?} for {name}"),
    };
    Ok(package)
}

fn apply_files(package: &mut Package, files: &Sections) -> Result<()> {
    package.owned_files = files
        .all("FILES")
        .iter()
        .map(|path| OwnedFile {
            path: path.clone(),
            size: 0,
            mode: 0,
        })
        .collect();
    package.backup_files = files
        .all("BACKUP")
        .iter()
        .map(|line| parse_backup_line(line.as_str()))
        .collect::<Result<_>>()
        .with_context(|| format!("parse %BACKUP% of {}", package.name))?;
    Ok(())
}

fn parse_backup_line(line: &str) -> Result<BackupFile> {
    let (path, md5) = line
        .split_once('\t')
        .ok_or_else(|| anyhow!("backup entry {line:?} has no checksum"))?;
    Ok(BackupFile {
        path: path.to_string(),
        md5: md5.trim().to_ascii_lowercase(),
    })
}
