//! Changeset computation between a stored snapshot and a current listing.
//!
//! Classification is by relative path: present only in the current listing
//! means added, present only in the snapshot means deleted, present in both
//! means modified when size or mtime differ and unchanged otherwise.
//! Unchanged files are excluded from the changeset entirely.
//!
//! The comparison is metadata-only by design. A file rewritten with
//! identical size and timestamp is not detected; that false-negative is the
//! price of never reading file contents during a scan. Path comparison is
//! byte-exact, so case sensitivity follows whatever the filesystem reported
//! during scanning. Only regular files are ever recorded, which makes a
//! type change (file to directory or back) fall out as deleted plus added,
//! never modified.

use crate::snapshot::{FileRecord, Snapshot};
use std::path::PathBuf;

/// The added/modified/deleted difference between a snapshot and a listing.
///
/// Derived and ephemeral: a changeset exists only for the duration of one
/// run and is never persisted beyond the transfer package built from it.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    /// Files present now but absent from the snapshot
    pub added: Vec<FileRecord>,
    /// Files present in both whose size or mtime changed
    pub modified: Vec<FileRecord>,
    /// Relative paths present in the snapshot but gone now
    pub deleted: Vec<PathBuf>,
}

impl Changeset {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Files that need copying into the additions tree.
    pub fn files_to_copy(&self) -> impl Iterator<Item = &FileRecord> {
        self.added.iter().chain(self.modified.iter())
    }

    /// Total count of classified entries.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }
}

/// Compute the changeset between a previous snapshot and a current listing.
///
/// Output ordering is sorted by relative path within each category so runs
/// over identical states produce identical changesets.
#[must_use]
pub fn diff(previous: &Snapshot, current: &[FileRecord]) -> Changeset {
    let mut changeset = Changeset::default();

    for record in current {
        match previous.get(&record.relative_path) {
            Some(prev) => {
                if prev.size != record.size || prev.modified != record.modified {
                    changeset.modified.push(record.clone());
                }
            }
            None => changeset.added.push(record.clone()),
        }
    }

    let current_paths: std::collections::HashSet<&PathBuf> =
        current.iter().map(|r| &r.relative_path).collect();

    for path in previous.records.keys() {
        if !current_paths.contains(path) {
            changeset.deleted.push(path.clone());
        }
    }

    changeset.added.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    changeset
        .modified
        .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    changeset.deleted.sort();

    changeset
}
