use crate::lock::{OperationType, RunLock};
use crate::registry::Registry;
use crate::{BackupContext, validate_location};
use anyhow::Result;

/// Stop tracking folders under a backup location.
///
/// The folders' snapshots are left in place; only tracking intent changes.
/// Re-adding a removed folder later requires a fresh `init`, since a diff
/// against the stale snapshot would misreport the folder's state.
///
/// # Errors
///
/// Returns an error if:
/// - The location name is invalid or has never been set up
/// - A path is not currently tracked
/// - The registry cannot be loaded or saved
pub fn execute(ctx: &BackupContext, location: &str, paths: &[String]) -> Result<()> {
    validate_location(location)?;

    if paths.is_empty() {
        anyhow::bail!("No folders given to untrack");
    }
    if !ctx.location_exists(location) {
        anyhow::bail!("No such backup location: '{location}'");
    }

    let resolved = super::add::resolve_all(paths)?;

    let _lock = RunLock::acquire(&ctx.locks_dir(location), OperationType::Registry, location)?;

    let registry_path = ctx.registry_path(location);
    let mut registry = Registry::load(&registry_path)?;
    registry.remove_folders(&resolved)?;
    registry.save(&registry_path)?;

    super::print_success(&format!(
        "Stopped tracking {} folder(s) for location '{location}':",
        resolved.len()
    ));
    for path in &resolved {
        println!("  {}", path.display());
    }

    Ok(())
}
