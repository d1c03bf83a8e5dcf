use crate::diff::diff;
use crate::errors::BackupError;
use crate::lock::{OperationType, RunLock};
use crate::registry::Registry;
use crate::scanner::FolderScanner;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::transfer::TransferPackage;
use crate::utils::format_size;
use crate::{BackupContext, validate_location};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// What happened to one folder during a backup run.
enum FolderOutcome {
    /// Staged and committed
    Succeeded {
        /// Files added since the last snapshot
        added: usize,
        /// Files modified since the last snapshot
        modified: usize,
        /// Files deleted since the last snapshot
        deleted: usize,
        /// Bytes copied into the additions tree
        bytes_copied: u64,
    },
    /// Failed; snapshot left at its pre-run state
    Failed(anyhow::Error),
}

/// Per-folder report collected for the end-of-run summary.
struct FolderReport {
    /// The tracked folder
    folder: std::path::PathBuf,
    /// Success or failure detail
    outcome: FolderOutcome,
    /// Files skipped by per-file scan errors (success or failure alike)
    skipped: Vec<crate::scanner::SkippedFile>,
}

/// Run a full backup for a location: scan every tracked folder, diff against
/// its snapshot, stage the changeset into a new transfer package, and commit
/// the new snapshot per folder.
///
/// Folder failures are isolated: a folder that cannot be scanned, was never
/// initialized, or had copy failures is reported and leaves its snapshot
/// untouched, while its siblings proceed normally. The command exits
/// non-zero if any folder failed.
///
/// # Errors
///
/// Returns an error if:
/// - The location name is invalid or nothing is tracked
/// - The transfer package structure cannot be created
/// - Any folder failed (after processing all of them)
pub fn execute(ctx: &BackupContext, location: &str) -> Result<()> {
    validate_location(location)?;

    let registry = Registry::load(&ctx.registry_path(location))?;
    if registry.is_empty() {
        anyhow::bail!(
            "No folders tracked for location '{location}'. Use 'bbud add {location} <paths>' first."
        );
    }

    let _lock = RunLock::acquire(&ctx.locks_dir(location), OperationType::Backup, location)?;

    // Scanning fans out across folders; everything that writes runs serially
    // below.
    let scanner = FolderScanner::from_config(&ctx.config.scan);
    let folders = registry.folders().to_vec();
    let listings = scanner.scan_many(&folders, ctx.config.scan.parallel_scan);

    let package = TransferPackage::create(&ctx.location_dir(location))?;
    let store = SnapshotStore::new(ctx.snapshots_dir(location));

    let mut reports = Vec::with_capacity(listings.len());
    for (folder, scan_result) in listings {
        let report = process_folder(&store, &package, &folder, scan_result);
        reports.push(report);
    }

    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, FolderOutcome::Failed(_)))
        .count();

    let summary = render_summary(location, &package, &reports);
    package.write_run_log(&summary)?;
    print_summary(&reports);
    println!("Transfer package: {}", package.root().display());

    if failed > 0 {
        anyhow::bail!("{failed} of {} folder(s) failed; their snapshots were not updated", reports.len());
    }

    Ok(())
}

/// Diff, stage and commit a single folder. The snapshot commit is the last
/// step and only happens when staging was clean.
fn process_folder(
    store: &SnapshotStore,
    package: &TransferPackage,
    folder: &Path,
    scan_result: Result<crate::scanner::Listing, BackupError>,
) -> FolderReport {
    let listing = match scan_result {
        Ok(listing) => listing,
        Err(e) => {
            return FolderReport {
                folder: folder.to_path_buf(),
                outcome: FolderOutcome::Failed(e.into()),
                skipped: Vec::new(),
            };
        }
    };
    let skipped = listing.skipped.clone();

    let previous = match store.load(folder) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            return FolderReport {
                folder: folder.to_path_buf(),
                outcome: FolderOutcome::Failed(
                    BackupError::SnapshotMissing {
                        folder: folder.to_path_buf(),
                    }
                    .into(),
                ),
                skipped,
            };
        }
        Err(e) => {
            return FolderReport {
                folder: folder.to_path_buf(),
                outcome: FolderOutcome::Failed(e),
                skipped,
            };
        }
    };

    let changeset = diff(&previous, &listing.records);
    let folder_name = folder
        .file_name()
        .map_or_else(|| "root".to_string(), |n| n.to_string_lossy().into_owned());

    let stage_outcome = match package.stage_folder(folder, &folder_name, &changeset) {
        Ok(outcome) => outcome,
        Err(e) => {
            return FolderReport {
                folder: folder.to_path_buf(),
                outcome: FolderOutcome::Failed(e),
                skipped,
            };
        }
    };

    if !stage_outcome.is_clean() {
        // Copy failures block the commit: the snapshot stays at its pre-run
        // state so a retried run regenerates the identical changeset
        let reasons: Vec<String> = stage_outcome
            .copy_errors
            .iter()
            .map(ToString::to_string)
            .collect();
        return FolderReport {
            folder: folder.to_path_buf(),
            outcome: FolderOutcome::Failed(anyhow::anyhow!(
                "{} file(s) failed to copy: {}",
                reasons.len(),
                reasons.join("; ")
            )),
            skipped,
        };
    }

    // Commit point: replace the snapshot with the scanned state
    let new_snapshot = Snapshot::from_records(folder.to_path_buf(), listing.records);
    if let Err(e) = store.save(folder, &new_snapshot) {
        return FolderReport {
            folder: folder.to_path_buf(),
            outcome: FolderOutcome::Failed(
                BackupError::SnapshotWrite {
                    folder: folder.to_path_buf(),
                    reason: e.to_string(),
                }
                .into(),
            ),
            skipped,
        };
    }

    info!(
        folder = %folder.display(),
        added = changeset.added.len(),
        modified = changeset.modified.len(),
        deleted = changeset.deleted.len(),
        "folder backed up"
    );

    FolderReport {
        folder: folder.to_path_buf(),
        outcome: FolderOutcome::Succeeded {
            added: changeset.added.len(),
            modified: changeset.modified.len(),
            deleted: changeset.deleted.len(),
            bytes_copied: stage_outcome.bytes_copied,
        },
        skipped,
    }
}

/// Print the colored console summary.
fn print_summary(reports: &[FolderReport]) {
    println!();
    for report in reports {
        match &report.outcome {
            FolderOutcome::Succeeded {
                added,
                modified,
                deleted,
                bytes_copied,
            } => {
                super::print_success(&format!(
                    "{}: {added} added, {modified} modified, {deleted} deleted ({} staged)",
                    report.folder.display(),
                    format_size(*bytes_copied)
                ));
            }
            FolderOutcome::Failed(e) => {
                super::print_error(&format!("{}: {e}", report.folder.display()));
            }
        }
        for skip in &report.skipped {
            super::print_warning(&format!("  skipped {}: {}", skip.path.display(), skip.reason));
        }
    }
}

/// Render the plain-text run log stored inside the package.
fn render_summary(location: &str, package: &TransferPackage, reports: &[FolderReport]) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "backup run for location '{location}' at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("package: {}", package.root().display()));

    for report in reports {
        match &report.outcome {
            FolderOutcome::Succeeded {
                added,
                modified,
                deleted,
                bytes_copied,
            } => {
                lines.push(format!(
                    "ok {}: {added} added, {modified} modified, {deleted} deleted, {bytes_copied} bytes staged",
                    report.folder.display()
                ));
            }
            FolderOutcome::Failed(e) => {
                lines.push(format!("failed {}: {e}", report.folder.display()));
            }
        }
        for skip in &report.skipped {
            lines.push(format!("  skipped {}: {}", skip.path.display(), skip.reason));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
