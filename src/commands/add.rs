use crate::lock::{OperationType, RunLock};
use crate::registry::Registry;
use crate::utils::resolve_folder_path;
use crate::{BackupContext, validate_location};
use anyhow::Result;
use std::path::PathBuf;

/// Track folders under a backup location.
///
/// # Errors
///
/// Returns an error if:
/// - The location name is invalid
/// - A path does not exist or is not a directory
/// - A path is already tracked (duplicate add)
/// - The registry cannot be loaded or saved
pub fn execute(ctx: &BackupContext, location: &str, paths: &[String]) -> Result<()> {
    validate_location(location)?;

    if paths.is_empty() {
        anyhow::bail!("No folders given to track");
    }

    let mut resolved = Vec::with_capacity(paths.len());
    for raw in paths {
        let path = resolve_folder_path(raw)?;
        if !path.is_dir() {
            anyhow::bail!("Not a directory: {}", path.display());
        }
        resolved.push(path);
    }

    ctx.ensure_location_exists(location)?;
    let _lock = RunLock::acquire(&ctx.locks_dir(location), OperationType::Registry, location)?;

    let registry_path = ctx.registry_path(location);
    let mut registry = Registry::load(&registry_path)?;
    registry.add_folders(&resolved)?;
    registry.save(&registry_path)?;

    super::print_success(&format!(
        "Tracking {} folder(s) for location '{location}':",
        resolved.len()
    ));
    for path in &resolved {
        println!("  {}", path.display());
    }
    println!("Run 'bbud init {location}' to seed snapshots for new folders.");

    Ok(())
}

/// Resolve folder arguments without touching the registry. Shared with `rm`
/// and `init`, which accept the same spellings.
///
/// # Errors
///
/// Returns an error if any path cannot be resolved.
pub fn resolve_all(paths: &[String]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|raw| resolve_folder_path(raw)).collect()
}
