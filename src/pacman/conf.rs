//! `pacman.conf` reader.
//!
//! Only the options that locate databases and cached packages are read:
//! `DBPath`, `CacheDir`, and the order of repository sections. Server lists
//! and `Include` directives only matter for downloading and are skipped.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "/var/lib/pacman/";
pub const DEFAULT_CACHE_DIR: &str = "/var/cache/pacman/pkg/";

const OPTIONS_SECTION: &str = "options";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacmanConf {
    pub db_path: PathBuf,
    pub cache_dirs: Vec<PathBuf>,
    /// Sync repositories in the order pacman consults them.
    pub repos: Vec<String>,
}

impl Default for PacmanConf {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            cache_dirs: vec![PathBuf::from(DEFAULT_CACHE_DIR)],
            repos: Vec::new(),
        }
    }
}

impl PacmanConf {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut db_path = None;
        let mut cache_dirs = Vec::new();
        let mut repos = Vec::new();
        let mut section = String::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                if section != OPTIONS_SECTION && !repos.contains(&section) {
                    repos.push(section.clone());
                }
                continue;
            }
            if section != OPTIONS_SECTION {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "DBPath" => db_path = Some(PathBuf::from(value.trim())),
                "CacheDir" => cache_dirs.extend(value.split_whitespace().map(PathBuf::from)),
                _ => {}
            }
        }

        let defaults = Self::default();
        Self {
            db_path: db_path.unwrap_or(defaults.db_path),
            cache_dirs: if cache_dirs.is_empty() {
                defaults.cache_dirs
            } else {
                cache_dirs
            },
            repos,
        }
    }
}
