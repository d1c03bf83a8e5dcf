use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Apply deletion manifests against a destination root.
///
/// This is the destination-side half of the two-phase transfer: after the
/// user copies the additions tree over, this pass removes every path listed
/// in the manifests. Each manifest line is treated as a literal relative
/// path. Paths already absent are reported, not treated as failures — the
/// manifest describes a state to reach, and "already gone" reaches it.
///
/// # Errors
///
/// Returns an error if:
/// - The destination root does not exist
/// - A manifest cannot be read
/// - Any listed path exists but cannot be removed
pub fn execute(dest_root: &str, manifests: &[String]) -> Result<()> {
    let root = Path::new(dest_root);
    if !root.is_dir() {
        anyhow::bail!("Destination root is not a directory: {dest_root}");
    }
    if manifests.is_empty() {
        anyhow::bail!("No deletion manifests given");
    }

    let mut deleted = 0usize;
    let mut missing = 0usize;
    let mut failed = 0usize;

    for manifest in manifests {
        let content = std::fs::read_to_string(manifest)
            .with_context(|| format!("Failed to read deletion manifest: {manifest}"))?;

        for line in content.lines() {
            if line.is_empty() {
                continue;
            }

            let target = root.join(line);
            if !target.exists() {
                super::print_info(&format!("not found (already gone): {}", target.display()));
                missing += 1;
                continue;
            }

            match std::fs::remove_file(&target) {
                Ok(()) => {
                    debug!(path = %target.display(), "deleted");
                    deleted += 1;
                }
                Err(e) => {
                    super::print_error(&format!("failed to delete {}: {e}", target.display()));
                    failed += 1;
                }
            }
        }
    }

    super::print_success(&format!(
        "Deletion pass complete: {deleted} deleted, {missing} already gone, {failed} failed"
    ));

    if failed > 0 {
        anyhow::bail!("{failed} path(s) could not be deleted");
    }

    Ok(())
}
