//! CLI argument parsing.
//!
//! The CLI only selects which flows run and where they read and write; the
//! flows themselves live in `backup` and `pkglist`.
use clap::Parser;
use std::path::{Path, PathBuf};

pub const DEFAULT_PACMAN_CONF: &str = "/etc/pacman.conf";
pub const DEFAULT_SCAN_DIR: &str = "/etc";

#[derive(Parser, Debug)]
#[command(
    name = "etcsnap",
    version,
    about = "Back up system configuration and package list",
    after_help = "With neither --etc nor --pkglist, both run.\n\nExamples:\n  etcsnap --output ~/backup\n  etcsnap --etc --report audit.json\n  etcsnap --root /mnt --pkglist --output /tmp/mnt-backup"
)]
pub struct RootArgs {
    /// Back up untracked and modified files of the scanned directory
    #[arg(long)]
    pub etc: bool,

    /// Write the explicitly installed package list
    #[arg(long)]
    pub pkglist: bool,

    /// Directory receiving the backup; its .gitignore filters scanned paths
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Root of the system to audit
    #[arg(long, value_name = "DIR", default_value = "/")]
    pub root: PathBuf,

    /// pacman configuration, as seen from the audited root
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PACMAN_CONF)]
    pub config: PathBuf,

    /// Directory to scan, as seen from the audited root
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SCAN_DIR)]
    pub scan_dir: PathBuf,

    /// Also write the classification of every scanned path as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

/// Which flows to run after applying the "neither means both" default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub etc: bool,
    pub pkglist: bool,
}

impl RootArgs {
    pub fn selection(&self) -> Selection {
        if !self.etc && !self.pkglist {
            return Selection {
                etc: true,
                pkglist: true,
            };
        }
        Selection {
            etc: self.etc,
            pkglist: self.pkglist,
        }
    }

    /// Scan directory as an absolute system path.
    pub fn scan_dir(&self) -> PathBuf {
        Path::new("/").join(&self.scan_dir)
    }
}
