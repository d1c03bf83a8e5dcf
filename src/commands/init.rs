use crate::lock::{OperationType, RunLock};
use crate::registry::Registry;
use crate::scanner::FolderScanner;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::{BackupContext, validate_location};
use anyhow::Result;
use tracing::info;

/// Seed snapshots for tracked folders without producing a changeset.
///
/// With no `paths`, every tracked folder is initialized; with `paths`, only
/// the named folders are (partial init). Existing snapshots for the named
/// folders are replaced wholesale, which is also how tracking restarts after
/// an `rm`/`add` cycle. Folders not named keep their snapshots untouched.
///
/// # Errors
///
/// Returns an error if:
/// - The location name is invalid or nothing is tracked
/// - A named path is not tracked
/// - Any folder fails to scan or its snapshot fails to write
pub fn execute(ctx: &BackupContext, location: &str, paths: &[String]) -> Result<()> {
    validate_location(location)?;

    let registry = Registry::load(&ctx.registry_path(location))?;
    if registry.is_empty() {
        anyhow::bail!(
            "No folders tracked for location '{location}'. Use 'bbud add {location} <paths>' first."
        );
    }

    let targets = if paths.is_empty() {
        registry.folders().to_vec()
    } else {
        let resolved = super::add::resolve_all(paths)?;
        for path in &resolved {
            if !registry.contains(path) {
                anyhow::bail!(
                    "Folder not tracked for location '{location}': {}",
                    path.display()
                );
            }
        }
        resolved
    };

    let _lock = RunLock::acquire(&ctx.locks_dir(location), OperationType::Init, location)?;

    let scanner = FolderScanner::from_config(&ctx.config.scan);
    let results = scanner.scan_many(&targets, ctx.config.scan.parallel_scan);
    let store = SnapshotStore::new(ctx.snapshots_dir(location));

    let mut failed = 0usize;
    let mut skipped_total = 0usize;

    for (folder, result) in results {
        match result {
            Ok(listing) => {
                for skip in &listing.skipped {
                    super::print_warning(&format!(
                        "Skipped {}: {}",
                        skip.path.display(),
                        skip.reason
                    ));
                }
                skipped_total += listing.skipped.len();

                let snapshot = Snapshot::from_records(folder.clone(), listing.records);
                match store.save(&folder, &snapshot) {
                    Ok(()) => {
                        info!(folder = %folder.display(), records = snapshot.len(), "snapshot seeded");
                        super::print_success(&format!(
                            "Initialized {} ({} files)",
                            folder.display(),
                            snapshot.len()
                        ));
                    }
                    Err(e) => {
                        super::print_error(&format!(
                            "Failed to write snapshot for {}: {e}",
                            folder.display()
                        ));
                        failed += 1;
                    }
                }
            }
            Err(e) => {
                super::print_error(&e.to_string());
                failed += 1;
            }
        }
    }

    if skipped_total > 0 {
        super::print_warning(&format!("{skipped_total} file(s) skipped due to errors"));
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} folder(s) failed to initialize", targets.len());
    }

    Ok(())
}
