use anyhow::{anyhow, Context, Result};
use md5::Digest;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Lowercase hex MD5, the checksum pacman records for backup files.
pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = md5::Md5::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Drop the leading `/` of a system path so it can be joined under another
/// directory. Relative paths are returned unchanged.
pub fn strip_root(path: &Path) -> &Path {
    path.strip_prefix("/").unwrap_or(path)
}

/// Write `bytes` to `path` through a temp file in the same directory, so a
/// reader never observes a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    staged
        .write_all(bytes)
        .with_context(|| format!("stage {}", path.display()))?;
    staged
        .as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .with_context(|| format!("set mode on {}", path.display()))?;
    staged
        .persist(path)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write `bytes` to `path`, creating parent directories first.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
