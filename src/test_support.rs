//! Fixture builders shared by unit tests.
use crate::pacman::{BackupFile, OwnedFile, Package};
use crate::util::{md5_hex, write_bytes};
use std::path::{Path, PathBuf};

pub(crate) fn zst_package(path: &Path, files: &[(&str, &[u8])]) -> PathBuf {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *contents)
            .expect("append member");
    }
    let tar = builder.into_inner().expect("finish tar");
    let bytes = zstd::stream::encode_all(tar.as_slice(), 3).expect("zstd encode");
    write_bytes(path, &bytes).expect("write package");
    path.to_path_buf()
}

/// A package owning `files` (relative paths) and marking `backups` with the
/// checksum of the given pristine content.
pub(crate) fn package_with(
    name: &str,
    version: &str,
    files: &[&str],
    backups: &[(&str, &[u8])],
) -> Package {
    let mut package = Package::new(name, version);
    package.owned_files = files
        .iter()
        .map(|path| OwnedFile {
            path: path.to_string(),
            size: 0,
            mode: 0,
        })
        .collect();
    package.backup_files = backups
        .iter()
        .map(|(path, pristine)| BackupFile {
            path: path.to_string(),
            md5: md5_hex(pristine),
        })
        .collect();
    package
}
