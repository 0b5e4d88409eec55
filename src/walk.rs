//! Candidate paths for classification.
//!
//! The walker yields regular files and symlinks, never descending into a
//! symlinked directory. The ignore filter applies gitignore rules from the
//! backup directory so secrets and noise can be kept out of the copy.
use crate::util::strip_root;
use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IGNORE_FILE: &str = ".gitignore";

/// Files and symlinks under `dir` (host paths), sorted by file name.
/// Entries that cannot be read are skipped.
pub fn walk_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() || entry.file_type().is_symlink())
        .map(walkdir::DirEntry::into_path)
}

#[derive(Debug, Default)]
pub struct IgnoreFilter {
    matcher: Option<Gitignore>,
}

impl IgnoreFilter {
    /// Filter that ignores nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Rules from `<dir>/.gitignore`; no file means nothing is ignored.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let ignore_file = dir.join(IGNORE_FILE);
        if !ignore_file.is_file() {
            return Ok(Self::none());
        }
        let mut builder = GitignoreBuilder::new(dir);
        if let Some(err) = builder.add(&ignore_file) {
            return Err(err).with_context(|| format!("parse {}", ignore_file.display()));
        }
        let matcher = builder
            .build()
            .with_context(|| format!("build ignore rules from {}", ignore_file.display()))?;
        tracing::debug!(rules = matcher.num_ignores(), "loaded ignore rules");
        Ok(Self {
            matcher: Some(matcher),
        })
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("/");
        for line in lines {
            builder
                .add_line(None, line)
                .with_context(|| format!("parse ignore rule {line:?}"))?;
        }
        let matcher = builder.build().context("build ignore rules")?;
        Ok(Self {
            matcher: Some(matcher),
        })
    }

    /// Whether the system path `path` (or one of its parent directories)
    /// matches an ignore rule. Rules are anchored at the system root, so
    /// `/etc/shadow` is checked as `etc/shadow`.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let Some(matcher) = &self.matcher else {
            return false;
        };
        matcher
            .matched_path_or_any_parents(strip_root(path), is_dir)
            .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::write_bytes;
    use std::os::unix::fs::symlink;

    #[test]
    fn yields_files_and_symlinks_without_following_dir_links() {
        let temp = tempfile::tempdir().expect("tempdir");
        let etc = temp.path().join("etc");
        write_bytes(&etc.join("b.conf"), b"b").expect("b");
        write_bytes(&etc.join("a/nested.conf"), b"n").expect("nested");
        write_bytes(&temp.path().join("outside/secret"), b"s").expect("outside");
        symlink(temp.path().join("outside"), etc.join("linked-dir")).expect("dir link");
        symlink("b.conf", etc.join("c-link")).expect("file link");

        let found: Vec<PathBuf> = walk_files(&etc)
            .map(|p| p.strip_prefix(&etc).expect("under etc").to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a/nested.conf"),
                PathBuf::from("b.conf"),
                PathBuf::from("c-link"),
                PathBuf::from("linked-dir"),
            ]
        );
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert_eq!(walk_files(&temp.path().join("absent")).count(), 0);
    }

    #[test]
    fn ignore_rules_cover_parents_and_anchors() {
        let filter =
            IgnoreFilter::from_lines(["/etc/shadow", "etc/ssl/", "*.pacnew"]).expect("rules");
        assert!(filter.is_ignored(Path::new("/etc/shadow"), false));
        assert!(filter.is_ignored(Path::new("/etc/ssl/certs/ca.pem"), false));
        assert!(filter.is_ignored(Path::new("/etc/pacman.conf.pacnew"), false));
        assert!(!filter.is_ignored(Path::new("/etc/hosts"), false));
    }

    #[test]
    fn from_dir_without_rules_ignores_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let filter = IgnoreFilter::from_dir(temp.path()).expect("filter");
        assert!(!filter.is_ignored(Path::new("/etc/shadow"), false));
    }

    #[test]
    fn from_dir_reads_gitignore() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_bytes(&temp.path().join(IGNORE_FILE), b"etc/gshadow*\n").expect("rules");
        let filter = IgnoreFilter::from_dir(temp.path()).expect("filter");
        assert!(filter.is_ignored(Path::new("/etc/gshadow-"), false));
        assert!(!filter.is_ignored(Path::new("/etc/group"), false));
    }
}
