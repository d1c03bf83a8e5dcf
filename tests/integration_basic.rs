use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Build a `bbud` command wired to an isolated backups root.
fn bbud(temp: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("bbud")?;
    cmd.env("BACKUPBUDDY_ROOT", temp.path().join("backups"))
        .env(
            "BACKUPBUDDY_CONFIG_PATH",
            temp.path().join("config/backupbuddy.toml"),
        )
        .env("HOME", temp.path());
    Ok(cmd)
}

fn make_source(temp: &TempDir, name: &str) -> Result<std::path::PathBuf> {
    let dir = temp.path().join("sources").join(name);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[test]
fn test_add_and_list() -> Result<()> {
    let temp = TempDir::new()?;
    let docs = make_source(&temp, "docs")?;

    bbud(&temp)?
        .args(["add", "usb", docs.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracking 1 folder(s)"));

    bbud(&temp)?
        .args(["list", "usb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docs"))
        .stdout(predicate::str::contains("not initialized"));

    Ok(())
}

#[test]
fn test_list_empty_location() -> Result<()> {
    let temp = TempDir::new()?;

    bbud(&temp)?
        .args(["list", "usb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No folders tracked"));

    Ok(())
}

#[test]
fn test_duplicate_add_fails() -> Result<()> {
    let temp = TempDir::new()?;
    let docs = make_source(&temp, "docs")?;

    bbud(&temp)?
        .args(["add", "usb", docs.to_str().unwrap()])
        .assert()
        .success();

    bbud(&temp)?
        .args(["add", "usb", docs.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already tracked"));

    Ok(())
}

#[test]
fn test_rm_untracked_fails() -> Result<()> {
    let temp = TempDir::new()?;
    let docs = make_source(&temp, "docs")?;
    let other = make_source(&temp, "other")?;

    bbud(&temp)?
        .args(["add", "usb", docs.to_str().unwrap()])
        .assert()
        .success();

    bbud(&temp)?
        .args(["rm", "usb", other.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not tracked"));

    Ok(())
}

#[test]
fn test_backup_before_init_fails() -> Result<()> {
    let temp = TempDir::new()?;
    let docs = make_source(&temp, "docs")?;
    fs::write(docs.join("a.txt"), "data")?;

    bbud(&temp)?
        .args(["add", "usb", docs.to_str().unwrap()])
        .assert()
        .success();

    bbud(&temp)?
        .args(["backup", "usb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("folder(s) failed"));

    Ok(())
}

#[test]
fn test_init_then_backup_flow() -> Result<()> {
    let temp = TempDir::new()?;
    let docs = make_source(&temp, "docs")?;
    fs::write(docs.join("a.txt"), "original")?;

    bbud(&temp)?
        .args(["add", "usb", docs.to_str().unwrap()])
        .assert()
        .success();

    bbud(&temp)?
        .args(["init", "usb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    fs::write(docs.join("b.txt"), "added later")?;

    bbud(&temp)?
        .args(["backup", "usb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 added"))
        .stdout(predicate::str::contains("Transfer package:"));

    // The staged copy exists under the package additions tree
    let location_dir = temp.path().join("backups/usb");
    let mut found = false;
    for entry in fs::read_dir(&location_dir)? {
        let path = entry?.path();
        let staged = path.join("to_transfer/additions/docs/b.txt");
        if staged.exists() {
            assert_eq!(fs::read(staged)?, b"added later");
            found = true;
        }
    }
    assert!(found, "staged addition not found in any package");

    Ok(())
}

#[test]
fn test_backup_unknown_location_fails() -> Result<()> {
    let temp = TempDir::new()?;

    bbud(&temp)?
        .args(["backup", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No folders tracked"));

    Ok(())
}

#[test]
fn test_apply_deletions_removes_and_reports_missing() -> Result<()> {
    let temp = TempDir::new()?;

    // Destination with one of the two listed files present
    let dest = temp.path().join("dest");
    fs::create_dir_all(dest.join("old"))?;
    fs::write(dest.join("old/report.txt"), "stale")?;

    let manifest = temp.path().join("Docs_deleted_paths.txt");
    fs::write(&manifest, "old/report.txt\nold/never-existed.txt\n")?;

    bbud(&temp)?
        .args([
            "apply-deletions",
            dest.to_str().unwrap(),
            manifest.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"))
        .stdout(predicate::str::contains("1 deleted"));

    assert!(!dest.join("old/report.txt").exists());

    Ok(())
}

#[test]
fn test_apply_deletions_missing_root_fails() -> Result<()> {
    let temp = TempDir::new()?;
    let manifest = temp.path().join("m.txt");
    fs::write(&manifest, "x.txt\n")?;

    bbud(&temp)?
        .args([
            "apply-deletions",
            temp.path().join("no-such-dest").to_str().unwrap(),
            manifest.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));

    Ok(())
}

#[test]
fn test_completion_generates_script() -> Result<()> {
    let temp = TempDir::new()?;

    bbud(&temp)?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bbud"));

    Ok(())
}
