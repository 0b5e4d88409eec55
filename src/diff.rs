//! Full-context unified diffs between a pristine file and its live copy.
//!
//! The whole file is always shown so the diff doubles as a complete record of
//! both versions. Anything that is not UTF-8 text is left alone.
use crate::pacman::Package;
use crate::util::strip_root;
use similar::TextDiff;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    lines: Vec<String>,
}

impl FileDiff {
    /// Diff lines, each with its trailing newline.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True when both sides were identical.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

/// UTF-8 without NUL bytes; everything else counts as binary.
pub fn decode_text(bytes: &[u8]) -> Option<&str> {
    if bytes.contains(&0) {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}

/// Unified diff from `historical` to `current`, or `None` when either side
/// is binary.
pub fn diff(historical: &[u8], current: &[u8], from_label: &str, to_label: &str) -> Option<FileDiff> {
    let old = decode_text(historical)?;
    let new = decode_text(current)?;
    // A radius past the longer file keeps every line in one hunk.
    let radius = old.lines().count().max(new.lines().count()) + 1;
    let text_diff = TextDiff::from_lines(old, new);
    let rendered = text_diff
        .unified_diff()
        .context_radius(radius)
        .header(from_label, to_label)
        .to_string();
    Some(FileDiff {
        lines: rendered.split_inclusive('\n').map(str::to_string).collect(),
    })
}

/// `<name>-<version>/<path>` for the pristine side and `current/<path>` for
/// the live side.
pub fn diff_labels(package: &Package, path: &Path) -> (String, String) {
    assert!(
        path.is_absolute(),
        "diff labels need an absolute path, got {}",
        path.display()
    );
    let rel = strip_root(path).display();
    (
        format!("{}-{}/{rel}", package.name, package.version),
        format!("current/{rel}"),
    )
}
