//! Native reader for cached package archives.
//!
//! Package files and sync databases are tar streams wrapped in zstd, xz or
//! gzip. The wrapper is sniffed from the leading magic bytes rather than the
//! file extension, so renamed or legacy archives still open.
use crate::cache::{ArchiveListing, RunCache};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";

/// Hard links pointing at hard links are legal tar, but a chain longer than
/// this is treated as corrupt.
const MAX_LINK_HOPS: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zstd,
    Xz,
    Gzip,
    Bzip2,
    None,
}

impl Compression {
    pub fn sniff(header: &[u8]) -> Self {
        if header.starts_with(ZSTD_MAGIC) {
            Compression::Zstd
        } else if header.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else if header.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if header.starts_with(BZIP2_MAGIC) {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }
}

/// Wrap `reader` in the decoder its magic bytes call for.
pub fn decompressed<R: Read + 'static>(reader: R) -> Result<Box<dyn Read>> {
    let mut reader = BufReader::new(reader);
    let header = reader.fill_buf().context("read archive header")?;
    let stream: Box<dyn Read> = match Compression::sniff(header) {
        Compression::Zstd => {
            Box::new(zstd::stream::read::Decoder::with_buffer(reader).context("open zstd stream")?)
        }
        Compression::Xz => Box::new(xz2::bufread::XzDecoder::new(reader)),
        Compression::Gzip => Box::new(flate2::bufread::GzDecoder::new(reader)),
        Compression::Bzip2 => bail!("bzip2 archives are not supported"),
        Compression::None => Box::new(reader),
    };
    Ok(stream)
}

pub fn open_tar(archive: &Path) -> Result<tar::Archive<Box<dyn Read>>> {
    let file = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let stream =
        decompressed(file).with_context(|| format!("decode {}", archive.display()))?;
    Ok(tar::Archive::new(stream))
}

/// Member names are compared without a leading `/` or `./`, matching how
/// makepkg stores them (`etc/foo.conf`).
pub fn normalize_member(name: &str) -> &str {
    let name = name.strip_prefix("./").unwrap_or(name);
    name.trim_start_matches('/')
}

fn entry_name<R: Read>(entry: &tar::Entry<'_, R>) -> Result<String> {
    let path = entry.path().context("read member name")?;
    Ok(normalize_member(&path.to_string_lossy()).to_string())
}

/// Member names of `archive`, read once per run and then served from `cache`.
pub fn list(cache: &mut RunCache, archive: &Path) -> Result<Arc<ArchiveListing>> {
    if let Some(listing) = cache.listing(archive) {
        return Ok(listing);
    }
    let mut tar = open_tar(archive)?;
    let mut members = Vec::new();
    for entry in tar
        .entries()
        .with_context(|| format!("list {}", archive.display()))?
    {
        let entry = entry.with_context(|| format!("list {}", archive.display()))?;
        members.push(entry_name(&entry)?);
    }
    tracing::debug!(archive = %archive.display(), members = members.len(), "listed archive");
    Ok(cache.store_listing(archive, ArchiveListing::new(members)))
}

/// Bytes of `member` as stored in `archive`, or `None` when the archive does
/// not contain it.
pub fn extract(cache: &mut RunCache, archive: &Path, member: &str) -> Result<Option<Vec<u8>>> {
    let member = normalize_member(member);
    let listing = list(cache, archive)?;
    if !listing.contains(member) {
        return Ok(None);
    }
    read_member(archive, member, MAX_LINK_HOPS)
}

fn read_member(archive: &Path, member: &str, hops_left: u8) -> Result<Option<Vec<u8>>> {
    let mut tar = open_tar(archive)?;
    for entry in tar
        .entries()
        .with_context(|| format!("read {}", archive.display()))?
    {
        let mut entry = entry.with_context(|| format!("read {}", archive.display()))?;
        if entry_name(&entry)? != member {
            continue;
        }
        if entry.header().entry_type().is_hard_link() {
            let Some(target) = entry.link_name().context("read link target")? else {
                return Ok(None);
            };
            let target = normalize_member(&target.to_string_lossy()).to_string();
            if hops_left == 0 {
                bail!("hard link chain too long at {member} in {}", archive.display());
            }
            return read_member(archive, &target, hops_left - 1);
        }
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("extract {member} from {}", archive.display()))?;
        return Ok(Some(bytes));
    }
    Ok(None)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
