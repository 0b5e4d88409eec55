//! The `--pkglist` flow: flat and grouped lists of explicit packages.
use crate::groups::{group_packages, PackageGroup};
use crate::pacman::{explicitly_installed, Package};
use crate::util::write_atomic;
use anyhow::Result;
use std::path::Path;

pub const PKGLIST_DIR: &str = "pkglist";
pub const INSTALLED_FILE: &str = "installed";
pub const GROUPED_FILE: &str = "grouped";

/// Write `pkglist/installed` and `pkglist/grouped` under `output_dir`.
pub fn backup_pkglist(output_dir: &Path, packages: &[Package]) -> Result<()> {
    let dir = output_dir.join(PKGLIST_DIR);
    let installed = explicitly_installed(packages);

    println!("Writing {PKGLIST_DIR}/{INSTALLED_FILE}");
    write_atomic(&dir.join(INSTALLED_FILE), render_installed(&installed).as_bytes())?;

    println!("Writing {PKGLIST_DIR}/{GROUPED_FILE}");
    let groups = group_packages(installed.iter().copied());
    write_atomic(&dir.join(GROUPED_FILE), render_grouped(&groups).as_bytes())?;
    Ok(())
}

pub fn render_installed(packages: &[&Package]) -> String {
    let mut out = String::new();
    for package in packages {
        out.push_str(&format!("{} {}\n", package.name, package.version));
    }
    out
}

pub fn render_grouped(groups: &[PackageGroup<'_>]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("[{}]\n", group.name));
        for package in &group.packages {
            out.push_str(&format!("  {} {}\n", package.name, package.version));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacman::{InstallReason, UNKNOWN_PACKAGER};

    fn pkg(name: &str, version: &str, groups: &[&str], packager: &str) -> Package {
        let mut package = Package::new(name, version);
        package.groups = groups.iter().map(|g| g.to_string()).collect();
        package.packager = packager.to_string();
        package
    }

    #[test]
    fn writes_flat_and_grouped_lists_of_explicit_packages() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut dependency = pkg("glibc", "2.40-1", &["base"], "Arch Bot");
        dependency.reason = InstallReason::Dependency;
        let packages = vec![
            pkg("bash", "5.2-1", &["base"], "Arch Bot"),
            dependency,
            pkg("coreutils", "9.5-1", &["base"], "Arch Bot"),
            pkg("yay", "12.3-1", &[], UNKNOWN_PACKAGER),
        ];

        backup_pkglist(temp.path(), &packages).expect("write lists");

        let installed =
            std::fs::read_to_string(temp.path().join("pkglist/installed")).expect("installed");
        assert_eq!(installed, "bash 5.2-1\ncoreutils 9.5-1\nyay 12.3-1\n");
        let grouped = std::fs::read_to_string(temp.path().join("pkglist/grouped")).expect("grouped");
        assert_eq!(
            grouped,
            "[base]\n  bash 5.2-1\n  coreutils 9.5-1\n[aur]\n  yay 12.3-1\n"
        );
    }

    #[test]
    fn empty_database_writes_empty_lists() {
        let temp = tempfile::tempdir().expect("tempdir");
        backup_pkglist(temp.path(), &[]).expect("write lists");
        let grouped = std::fs::read_to_string(temp.path().join("pkglist/grouped")).expect("grouped");
        assert!(grouped.is_empty());
    }
}
