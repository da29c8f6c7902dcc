#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use std::fs;

fn layerconf_cmd() -> assert_cmd::Command {
	let mut cmd = assert_cmd::Command::cargo_bin("layerconf").unwrap();
	cmd.env_remove("RUST_LOG");
	cmd
}

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_help_flag() {
	layerconf_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("Merge TOML, JSON and environment"));
}

#[test]
fn test_version_flag() {
	layerconf_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("layerconf"));
}

#[test]
fn test_no_args_shows_help() {
	layerconf_cmd()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// show
// ============================================================================

#[test]
fn test_show_merges_files_in_order() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path().join("base.toml");
	let local = temp_dir.path().join("local.json");

	fs::write(
		&base,
		r#"
[server]
host = "0.0.0.0"
port = 8080
"#,
	)
	.unwrap();
	fs::write(&local, r#"{"server": {"port": 9090}}"#).unwrap();

	layerconf_cmd()
		.args(["show", "--file"])
		.arg(&base)
		.arg("--file")
		.arg(&local)
		.assert()
		.success()
		.stdout(predicate::str::contains(r#""host": "0.0.0.0""#))
		.stdout(predicate::str::contains(r#""port": 9090"#))
		.stdout(predicate::str::contains("8080").not());
}

#[test]
fn test_show_applies_environment_last() {
	let temp_dir = tempfile::tempdir().unwrap();
	let base = temp_dir.path().join("base.toml");
	fs::write(&base, "[server]\nport = 8080\n").unwrap();

	layerconf_cmd()
		.args(["show", "--env-prefix", "LAYERCONF_CLI_TEST", "--file"])
		.arg(&base)
		.env("LAYERCONF_CLI_TEST_SERVER_PORT", "7000")
		.env("LAYERCONF_CLI_TEST_SERVER_TAGS", "a,b")
		.assert()
		.success()
		.stdout(predicate::str::contains(r#""port": "7000""#))
		.stdout(predicate::str::contains(r#""a""#))
		.stdout(predicate::str::contains(r#""b""#));
}

#[test]
fn test_show_without_sources_fails() {
	layerconf_cmd()
		.arg("show")
		.assert()
		.failure()
		.stderr(predicate::str::contains("no loaders used"));
}

#[test]
fn test_show_rejects_unknown_extension() {
	let temp_dir = tempfile::tempdir().unwrap();
	let path = temp_dir.path().join("config.yaml");
	fs::write(&path, "a: 1\n").unwrap();

	layerconf_cmd()
		.args(["show", "--file"])
		.arg(&path)
		.assert()
		.failure()
		.stderr(predicate::str::contains("Cannot infer config format"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_valid_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let path = temp_dir.path().join("app.toml");
	fs::write(&path, "name = \"svc\"\n").unwrap();

	layerconf_cmd()
		.args(["check", "--file"])
		.arg(&path)
		.assert()
		.success()
		.stdout(predicate::str::contains("configuration OK"));
}

#[test]
fn test_check_invalid_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let path = temp_dir.path().join("app.toml");
	fs::write(&path, "invalid toml [[[").unwrap();

	layerconf_cmd()
		.args(["check", "--file"])
		.arg(&path)
		.assert()
		.failure()
		.stderr(predicate::str::contains("failed to parse toml config file"));
}

#[test]
fn test_check_directory_is_not_a_file() {
	let temp_dir = tempfile::tempdir().unwrap();
	let path = temp_dir.path().join("conf.d.json");
	fs::create_dir(&path).unwrap();

	layerconf_cmd()
		.args(["check", "--file"])
		.arg(&path)
		.assert()
		.failure()
		.stderr(predicate::str::contains("not a regular file"));
}

#[test]
fn test_check_shows_error_cause() {
	let temp_dir = tempfile::tempdir().unwrap();
	let missing = temp_dir.path().join("missing.toml");

	layerconf_cmd()
		.args(["check", "--file"])
		.arg(&missing)
		.assert()
		.failure()
		.stderr(predicate::str::contains("error: not a regular file"))
		.stderr(predicate::str::contains("No such file or directory"));
}

#[test]
fn test_rust_log_overrides_default_level() {
	let temp_dir = tempfile::tempdir().unwrap();
	let path = temp_dir.path().join("app.toml");
	fs::write(&path, "name = \"svc\"\n").unwrap();

	layerconf_cmd()
		.args(["check", "--file"])
		.arg(&path)
		.env("RUST_LOG", "debug")
		.assert()
		.success()
		.stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_check_reports_first_error_only() {
	let temp_dir = tempfile::tempdir().unwrap();
	let missing = temp_dir.path().join("missing.toml");
	let broken = temp_dir.path().join("broken.json");
	fs::write(&broken, "{").unwrap();

	layerconf_cmd()
		.args(["check", "--file"])
		.arg(&missing)
		.arg("--file")
		.arg(&broken)
		.assert()
		.failure()
		.stderr(predicate::str::contains("missing.toml"))
		.stderr(predicate::str::contains("broken.json").not());
}
