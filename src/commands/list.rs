use crate::registry::Registry;
use crate::snapshot::SnapshotStore;
use crate::{BackupContext, validate_location};
use anyhow::Result;

/// List the folders tracked by a backup location, in tracking order.
///
/// Folders whose snapshots are missing are flagged so the user knows which
/// ones still need an `init` before they can be backed up.
///
/// # Errors
///
/// Returns an error if the location name is invalid or the registry cannot
/// be loaded.
pub fn execute(ctx: &BackupContext, location: &str) -> Result<()> {
    validate_location(location)?;

    let registry = Registry::load(&ctx.registry_path(location))?;
    if registry.is_empty() {
        super::print_info(&format!("No folders tracked for location '{location}'"));
        return Ok(());
    }

    let store = SnapshotStore::new(ctx.snapshots_dir(location));

    println!("Tracked folders for location '{location}':");
    for folder in registry.folders() {
        if store.contains(folder) {
            println!("  {}", folder.display());
        } else {
            println!("  {} (not initialized)", folder.display());
        }
    }

    Ok(())
}
