//! Shared test infrastructure for integration tests.
//!
//! Builds a throwaway system root with a pacman configuration, a local
//! database, a gzip sync database and a zstd package cache, then runs the
//! `etcsnap` binary against it.

#![allow(dead_code)]

use etcsnap::util::md5_hex;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub const PACMAN_CONF: &str = "\
[options]
DBPath = /var/lib/pacman/
CacheDir = /var/cache/pacman/pkg/

[core]
Server = https://mirror.example/$repo/os/$arch
";

/// One installed package in the fake root.
pub struct FakePackage {
    pub name: &'static str,
    pub version: &'static str,
    pub groups: &'static [&'static str],
    pub packager: &'static str,
    pub dependency: bool,
    pub files: &'static [&'static str],
    /// Backup files with their pristine contents.
    pub backups: &'static [(&'static str, &'static [u8])],
}

impl FakePackage {
    pub fn explicit(name: &'static str, version: &'static str) -> Self {
        Self {
            name,
            version,
            groups: &[],
            packager: "Arch Bot <bot@example.org>",
            dependency: false,
            files: &[],
            backups: &[],
        }
    }

    fn dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    fn archive_name(&self) -> String {
        format!("{}-x86_64.pkg.tar.zst", self.dir_name())
    }

    fn desc(&self) -> String {
        let mut desc = format!("%NAME%\n{}\n\n%VERSION%\n{}\n\n", self.name, self.version);
        if !self.groups.is_empty() {
            desc.push_str("%GROUPS%\n");
            for group in self.groups {
                desc.push_str(group);
                desc.push('\n');
            }
            desc.push('\n');
        }
        desc.push_str(&format!("%PACKAGER%\n{}\n\n", self.packager));
        if self.dependency {
            desc.push_str("%REASON%\n1\n\n");
        }
        desc
    }

    fn files_manifest(&self) -> String {
        let mut files = String::from("%FILES%\n");
        for path in self.files {
            files.push_str(path);
            files.push('\n');
        }
        files.push_str("\n%BACKUP%\n");
        for (path, pristine) in self.backups {
            files.push_str(&format!("{path}\t{}\n", md5_hex(pristine)));
        }
        files.push('\n');
        files
    }
}

pub struct FakeSystem {
    temp: TempDir,
}

impl FakeSystem {
    pub fn new(packages: &[FakePackage]) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let system = Self { temp };
        system.write("etc/pacman.conf", PACMAN_CONF.as_bytes());
        system.write("var/lib/pacman/local/ALPM_DB_VERSION", b"9\n");

        let mut sync = tar::Builder::new(Vec::new());
        for package in packages {
            let entry = format!("var/lib/pacman/local/{}", package.dir_name());
            system.write(&format!("{entry}/desc"), package.desc().as_bytes());
            system.write(&format!("{entry}/files"), package.files_manifest().as_bytes());

            let sync_desc = format!(
                "%FILENAME%\n{}\n\n%NAME%\n{}\n\n%VERSION%\n{}\n\n",
                package.archive_name(),
                package.name,
                package.version
            );
            append(&mut sync, &format!("{}/desc", package.dir_name()), sync_desc.as_bytes());
        }
        let sync = sync.into_inner().expect("finish sync tar");
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(&sync).expect("gzip sync db");
        system.write(
            "var/lib/pacman/sync/core.db",
            &gz.finish().expect("finish gzip"),
        );
        system
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("root")
    }

    pub fn output(&self) -> PathBuf {
        self.temp.path().join("backup")
    }

    /// Write a file at a path relative to the fake root.
    pub fn write(&self, rel: &str, contents: &[u8]) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
    }

    /// Place a package archive holding `members` in the pacman cache.
    pub fn cache_package(&self, package: &FakePackage, members: &[(&str, &[u8])]) {
        let mut builder = tar::Builder::new(Vec::new());
        append(&mut builder, ".PKGINFO", b"pkgname = placeholder\n");
        for (name, contents) in members {
            append(&mut builder, name, contents);
        }
        let tar = builder.into_inner().expect("finish package tar");
        let bytes = zstd::stream::encode_all(tar.as_slice(), 3).expect("zstd encode");
        self.write(
            &format!("var/cache/pacman/pkg/{}", package.archive_name()),
            &bytes,
        );
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let output = Command::new(env!("CARGO_BIN_EXE_etcsnap"))
            .arg("--root")
            .arg(self.root())
            .arg("--output")
            .arg(self.output())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("run etcsnap");
        if !output.status.success() {
            eprintln!("stdout:\n{}", String::from_utf8_lossy(&output.stdout));
            eprintln!("stderr:\n{}", String::from_utf8_lossy(&output.stderr));
        }
        output
    }

    pub fn read_output(&self, rel: &str) -> String {
        let path = self.output().join(rel);
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
    }

    pub fn output_exists(&self, rel: &str) -> bool {
        self.output().join(rel).exists()
    }
}

fn append(builder: &mut tar::Builder<Vec<u8>>, name: &str, contents: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, name, contents)
        .expect("append tar member");
}
