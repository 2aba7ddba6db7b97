use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::process::Command;

/// Integration tests for RepoWarden CLI commands
/// These tests run the actual binary and verify its behavior without reaching GitHub

fn run(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn write_config(temp_dir: &TempDir, content: &str) -> String {
    let config = temp_dir.child("config.yml");
    config.write_str(content).unwrap();
    config.path().to_str().unwrap().to_string()
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    for command in ["init", "auth", "list", "sync"] {
        assert!(
            predicate::str::contains(command).eval(&*stdout),
            "help is missing '{}'",
            command
        );
    }
}

#[test]
fn test_cli_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("repowarden"));
}

#[test]
fn test_sync_help_lists_filter_flags() {
    let output = run(&["sync", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = predicate::str::contains("--dry-run")
        .and(predicate::str::contains("--name-pattern"))
        .and(predicate::str::contains("--label"))
        .and(predicate::str::contains("--language"))
        .and(predicate::str::contains("--settings"));
    assert!(expected.eval(&*stdout));
}

#[test]
fn test_init_writes_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.child("repowarden").child("config.yml");

    let output = run(&[
        "--config",
        config.path().to_str().unwrap(),
        "init",
        "--org",
        "acme",
        "--settings",
        "/etc/repowarden/settings.yml",
    ]);

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    config.assert(predicate::path::exists());
    config.assert(predicate::str::contains("organization: acme"));
    config.assert(predicate::str::contains("/etc/repowarden/settings.yml"));
}

#[test]
fn test_invalid_command() {
    let output = run(&["invalid-command"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand") || stderr.contains("error"));
}

#[test]
fn test_error_handling_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir, "invalid: yaml: content: [");

    let output = run(&["--config", &config_path, "list", "--org", "acme"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parse") || stderr.contains("config"));
}

#[test]
fn test_missing_organization_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir, "github:\n  auth_method: token\n");

    let output = run(&["--config", &config_path, "list"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No organization given"));
}

#[test]
fn test_invalid_name_pattern_fails_before_authentication() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir, "github:\n  organization: acme\n");

    let output = run(&["--config", &config_path, "list", "--name-pattern", "svc-("]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid repository name pattern"));
}

#[test]
fn test_invalid_role_in_settings_document() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir, "github:\n  organization: acme\n");
    let settings = temp_dir.child("settings.yml");
    settings
        .write_str("collaborators:\n  - username: alice\n    role: owner\n")
        .unwrap();

    let output = run(&[
        "--config",
        &config_path,
        "sync",
        "--settings",
        settings.path().to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown collaborator role 'owner'"));
}

#[test]
fn test_missing_settings_document() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir, "github:\n  organization: acme\n");
    let missing = temp_dir.child("missing.yml");

    let output = run(&[
        "--config",
        &config_path,
        "sync",
        "--dry-run",
        "--settings",
        missing.path().to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read settings file"));
}
