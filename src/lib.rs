//! etcsnap: back up the parts of `/etc` that pacman does not already know.
//!
//! Files under the scanned directory are classified against the local package
//! database. Untracked files and modified backup files are copied out, and for
//! modified files the pristine version is pulled from the package cache so a
//! full-context diff can be written next to the copy.
pub mod archive;
pub mod backup;
pub mod cache;
pub mod cli;
pub mod diff;
pub mod groups;
pub mod history;
pub mod pacman;
pub mod pkglist;
pub mod report;
pub mod status;
pub mod sysroot;
pub mod util;
pub mod walk;

#[cfg(test)]
mod test_support;
