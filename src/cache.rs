//! Per-run memo for lookups that are expensive and never change mid-run.
//!
//! A [`RunCache`] lives for exactly one audit and is passed by reference to
//! whatever needs it. Dropping it at any point only costs recomputation.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Member names of one archive, in archive order.
#[derive(Debug, Default)]
pub struct ArchiveListing {
    members: Vec<String>,
    lookup: HashSet<String>,
}

impl ArchiveListing {
    pub fn new(members: Vec<String>) -> Self {
        let lookup = members.iter().cloned().collect();
        Self { members, lookup }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, member: &str) -> bool {
        self.lookup.contains(member)
    }
}

#[derive(Debug, Default)]
pub struct RunCache {
    listings: HashMap<PathBuf, Arc<ArchiveListing>>,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self, archive: &Path) -> Option<Arc<ArchiveListing>> {
        self.listings.get(archive).cloned()
    }

    pub fn store_listing(&mut self, archive: &Path, listing: ArchiveListing) -> Arc<ArchiveListing> {
        let listing = Arc::new(listing);
        self.listings
            .insert(archive.to_path_buf(), Arc::clone(&listing));
        listing
    }

    pub fn cached_archives(&self) -> usize {
        self.listings.len()
    }
}
