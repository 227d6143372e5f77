//! Removal of files that no longer belong in the mirror.

use std::path::Path;

use assetsync_fs::Entry;

use crate::error::Result;
use crate::manifest::Manifest;

/// What a reconciliation did to each file it looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    /// Subdirectories, left alone.
    pub skipped: Vec<String>,
    /// Files that should have been removed but could not be.
    pub errors: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Keep,
    Remove,
    Skip,
}

/// Deletes mirror files whose name is neither a manifest entry nor its
/// compressed form.
///
/// Run it only once every fetch of a batch has finished; a staging file for a
/// fetch in flight would otherwise be removed under it.
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    manifest: &'a Manifest,
}

impl<'a> Reconciler<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self { manifest }
    }

    pub fn action(&self, entry: &Entry) -> Action {
        if !entry.is_file {
            Action::Skip
        } else if self.manifest.allows(assetsync_fs::bare_name(&entry.name)) {
            Action::Keep
        } else {
            Action::Remove
        }
    }

    /// Decide what to do with each listed entry without touching the disk.
    pub fn plan<'e>(&self, entries: &'e [Entry]) -> Vec<(&'e Entry, Action)> {
        entries.iter().map(|entry| (entry, self.action(entry))).collect()
    }

    /// Reconcile the directory at `root`.
    ///
    /// Only a failure to list `root` is an error; a file that cannot be
    /// removed is logged, recorded in the report, and the rest continue.
    pub fn apply(&self, root: impl AsRef<Path>) -> Result<ReconcileReport> {
        let root = root.as_ref();
        let entries = assetsync_fs::list_dir(root)?;
        let mut report = ReconcileReport::default();

        for (entry, action) in self.plan(&entries) {
            match action {
                Action::Keep => report.kept.push(entry.name.clone()),
                Action::Skip => {
                    tracing::debug!(path = %entry.path.display(), "skipping directory");
                    report.skipped.push(entry.name.clone());
                }
                Action::Remove => match remove(&entry.path) {
                    Ok(()) => {
                        tracing::info!(path = %entry.path.display(), "removed file not in manifest");
                        report.removed.push(entry.name.clone());
                    }
                    Err(e) => {
                        tracing::error!(path = %entry.path.display(), error = %e, "failed to remove file");
                        report.errors.push(entry.name.clone());
                    }
                },
            }
        }

        Ok(report)
    }
}

fn remove(path: &Path) -> assetsync_fs::Result<()> {
    assetsync_fs::remove_if_exists(path).map(drop)
}
