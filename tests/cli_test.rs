//! Integration tests for the hostprep binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A project whose config points detection at a fake os-release file.
fn setup_project(os_release: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let os_release_path = temp.path().join("os-release");
    fs::write(&os_release_path, os_release).unwrap();

    let config_dir = temp.path().join(".hostprep");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.yml"),
        format!(
            "settings:\n  os_release_path: {}\n  rules_dir: {}\n",
            os_release_path.display(),
            temp.path().join("rules.d").display()
        ),
    )
    .unwrap();
    temp
}

fn hostprep(project: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("hostprep"));
    cmd.current_dir(project)
        .env_remove("HOSTPREP_PROMPT_UNSUPPORTED_PLATFORM")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("hostprep"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Development host provisioning"))
        .stdout(predicate::str::contains("detect"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("hostprep"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_run_help_lists_flags() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("hostprep"));
    cmd.args(["run", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("--non-interactive"))
        .stdout(predicate::str::contains("--json"));
    Ok(())
}

#[test]
fn cli_rejects_unknown_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("hostprep"));
    cmd.arg("teardown");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_completions_bash() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("hostprep"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hostprep"));
    Ok(())
}

#[test]
fn cli_invalid_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let config_dir = temp.path().join(".hostprep");
    fs::create_dir_all(&config_dir)?;
    fs::write(config_dir.join("config.yml"), "settings:\n  bogus_key: 1\n")?;

    hostprep(temp.path())
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
    Ok(())
}

#[test]
fn cli_missing_explicit_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hostprep(temp.path())
        .args(["detect", "--config", "nope.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn cli_detect_json_reads_configured_os_release() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("ID=ubuntu\nVERSION_ID=\"22.04\"\nVERSION_CODENAME=jammy\n");

    let output = hostprep(temp.path()).args(["detect", "--json"]).output()?;
    assert!(output.status.success());

    let profile: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(profile["distribution_id"], "ubuntu");
    assert_eq!(profile["version_codename"], "jammy");
    assert_eq!(profile["supported"], true);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn cli_detect_human_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("ID=ubuntu\nVERSION_ID=\"24.04\"\nVERSION_CODENAME=noble\n");

    hostprep(temp.path())
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("ubuntu 24.04 (noble)"))
        .stdout(predicate::str::contains("apt-get"));
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn cli_detect_missing_os_release_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("");
    fs::remove_file(temp.path().join("os-release"))?;

    hostprep(temp.path())
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot identify host platform"));
    Ok(())
}

// Stops before any package work: either privilege escalation is missing
// or the unsupported-platform prompt is declined by default.
#[cfg(target_os = "linux")]
#[test]
fn cli_unsupported_platform_non_interactive_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("ID=debian\nVERSION_ID=\"11\"\nVERSION_CODENAME=bullseye\n");

    hostprep(temp.path())
        .args(["run", "--non-interactive"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[✓] detect platform"));
    Ok(())
}
