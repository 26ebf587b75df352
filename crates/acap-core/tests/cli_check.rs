//! CLI tests for acap-core.
//!
//! These tests run the binary against the reference host and verify
//! payloads, exit codes, and configuration handling.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the acap-core binary with config discovery isolated.
fn acap_core(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("acap-core").expect("acap-core binary should exist");
    cmd.env_remove("ACAP_ENGINE_CONFIG")
        .env_remove("ACAP_LOG")
        .env_remove("RUST_LOG")
        .env("ACAP_CONFIG_DIR", config_home.path())
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path());
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("custom.json");
    fs::write(&path, body).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ============================================================================
// check
// ============================================================================

mod check {
    use super::*;

    #[test]
    fn healthy_reference_host_is_supported() {
        let home = TempDir::new().unwrap();
        let output = acap_core(&home).arg("check").output().unwrap();

        assert_eq!(output.status.code(), Some(0));
        let json = stdout_json(&output);
        assert_eq!(json["schema_version"], "1.0.0");
        assert_eq!(json["host"], "reference");
        assert_eq!(json["verdict"]["supported"], true);
        assert_eq!(json["verdict"]["decision"]["kind"], "supported");
        assert_eq!(json["verdict"]["probes"].as_array().unwrap().len(), 4);
        assert_eq!(json["cache"]["executions"], 4);
        assert!(json["run_id"].as_str().unwrap().starts_with("run-"));
    }

    #[test]
    fn no_subcommand_defaults_to_check() {
        let home = TempDir::new().unwrap();
        acap_core(&home).assert().code(0);
    }

    #[test]
    fn merger_defect_is_unsupported() {
        let home = TempDir::new().unwrap();
        let output = acap_core(&home)
            .args(["check", "--defect", "merger_drops_input"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let json = stdout_json(&output);
        assert_eq!(json["verdict"]["supported"], false);
        assert_eq!(json["verdict"]["decision"]["kind"], "async_probes_negative");
        assert_eq!(json["verdict"]["decision"]["probes"][0], "merging");
    }

    #[test]
    fn rejected_options_stop_before_async_stage() {
        let home = TempDir::new().unwrap();
        let output = acap_core(&home)
            .args(["check", "--defect", "rejects_context_options"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let json = stdout_json(&output);
        assert_eq!(json["verdict"]["decision"]["kind"], "sync_probe_negative");
        assert_eq!(json["verdict"]["decision"]["probe"], "context_options");
        assert_eq!(json["cache"]["executions"], 1);
    }

    #[test]
    fn never_settling_decode_times_out() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .args(["check", "--defect", "decode_never_settles", "--timeout-ms", "50"])
            .assert()
            .code(1);
    }

    #[test]
    fn summary_format() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .args(["--format", "summary", "check"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("check: SUPPORTED"));
    }

    #[test]
    fn exitcode_format_prints_nothing() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .args(["--format", "exitcode", "check", "--defect", "close_unsupported"])
            .assert()
            .code(1)
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn unknown_defect_is_an_argument_error() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .args(["check", "--defect", "melts_speakers"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown host defect"));
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn config_file_defects_and_overrides_apply() {
        let home = TempDir::new().unwrap();
        let path = write_config(
            &home,
            r#"{"schema_version": "1.0.0", "baseline_overrides": {"web_audio": false}}"#,
        );
        let output = acap_core(&home)
            .args(["--config", path.to_str().unwrap(), "check"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let json = stdout_json(&output);
        assert_eq!(json["config_source"], "CLI argument");
        assert_eq!(json["verdict"]["decision"]["kind"], "baseline_unavailable");
        assert_eq!(json["verdict"]["decision"]["flag"], "web_audio");
        assert_eq!(json["cache"]["executions"], 0);
    }

    #[test]
    fn disabled_probe_is_skipped() {
        let home = TempDir::new().unwrap();
        let path = write_config(
            &home,
            r#"{"schema_version": "1.0.0", "disabled_probes": ["merging"], "reference_host": {"defects": ["merger_drops_input"]}}"#,
        );
        let output = acap_core(&home)
            .args(["--config", path.to_str().unwrap(), "check"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout_json(&output)["verdict"]["probes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn unknown_disabled_probe_is_rejected() {
        let home = TempDir::new().unwrap();
        let path = write_config(&home, r#"{"schema_version": "1.0.0", "disabled_probes": ["reverb"]}"#);
        acap_core(&home)
            .args(["--config", path.to_str().unwrap(), "check"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("reverb"));
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let home = TempDir::new().unwrap();
        let path = write_config(&home, "{ not json");
        acap_core(&home)
            .args(["--config", path.to_str().unwrap(), "check"])
            .assert()
            .code(11);
    }

    #[test]
    fn forcing_a_flag_on_is_rejected() {
        let home = TempDir::new().unwrap();
        let path = write_config(
            &home,
            r#"{"schema_version": "1.0.0", "baseline_overrides": {"promises": true}}"#,
        );
        acap_core(&home)
            .args(["--config", path.to_str().unwrap(), "config", "show"])
            .assert()
            .code(11);
    }

    #[test]
    fn show_reports_defaults_without_files() {
        let home = TempDir::new().unwrap();
        let output = acap_core(&home).args(["config", "show"]).output().unwrap();

        assert_eq!(output.status.code(), Some(0));
        let json = stdout_json(&output);
        assert_eq!(json["source"]["using_defaults"], true);
        assert_eq!(json["engine"]["schema_version"], "1.0.0");
        assert_eq!(json["engine"]["report_probe_failures"], true);
    }

    #[test]
    fn show_reports_environment_source() {
        let home = TempDir::new().unwrap();
        let path = write_config(&home, r#"{"schema_version": "1.0.0", "async_stage_timeout_ms": 2000}"#);
        let output = acap_core(&home)
            .env("ACAP_ENGINE_CONFIG", &path)
            .args(["config", "show"])
            .output()
            .unwrap();

        let json = stdout_json(&output);
        assert_eq!(json["source"]["kind"], "environment variable");
        assert_eq!(json["engine"]["async_stage_timeout_ms"], 2000);
    }
}

// ============================================================================
// probes
// ============================================================================

mod probes {
    use super::*;

    #[test]
    fn lists_standard_probes_in_order() {
        let home = TempDir::new().unwrap();
        let output = acap_core(&home).arg("probes").output().unwrap();

        assert_eq!(output.status.code(), Some(0));
        let json = stdout_json(&output);
        let names: Vec<_> = json["probes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["context_options", "close", "decode_error_type", "merging"]);
        assert_eq!(json["probes"][0]["stage"], "sync");
        assert_eq!(json["probes"][3]["stage"], "async");
    }

    #[test]
    fn summary_lists_one_probe_per_line() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .args(["-f", "summary", "probes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("probe#2\tasync\tdecode_error_type"));
    }
}

mod invalid_arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        let home = TempDir::new().unwrap();
        acap_core(&home)
            .args(["--config", "/nonexistent/engine.json", "check"])
            .assert()
            .failure();
    }
}
