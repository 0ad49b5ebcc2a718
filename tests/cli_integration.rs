//! CLI integration tests for Gantry.
//!
//! These tests verify the full CLI workflow from a declaration file on disk
//! through resolution output.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the gantry binary command.
fn gantry() -> Command {
    Command::cargo_bin("gantry").unwrap()
}

/// Write a declaration file into a temp dir and return its path.
fn write_manifest(tmp: &TempDir, contents: &str) -> PathBuf {
    let path = tmp.path().join("Modules.toml");
    fs::write(&path, contents).unwrap();
    path
}

const SAMPLE: &str = r#"
[[module]]
name = "Core"

[[module]]
name = "Engine"
public_deps = ["Core"]

[[module]]
name = "SecretIdentity"
public_deps = ["Core", "Engine"]

[[module]]
name = "MetasoundEditor"

[[module]]
name = "CitySampleEditor"
private_deps = ["Engine"]

[[module.rules]]
when = "editor"
add = ["MetasoundEditor"]

[[target]]
name = "SecretIdentity"
type = "game"
extra_modules = ["SecretIdentity"]

[[target]]
name = "EditorTarget"
type = "editor"
extra_modules = ["CitySampleEditor"]
"#;

// ============================================================================
// gantry resolve
// ============================================================================

#[test]
fn test_resolve_orders_dependencies_first() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    let output = gantry()
        .args(["resolve", "SecretIdentity", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let core = stdout.find("Core").unwrap();
    let engine = stdout.find("Engine").unwrap();
    let game = stdout.find("SecretIdentity\n").unwrap();
    assert!(core < game);
    assert!(engine < game);
}

#[test]
fn test_resolve_editor_flag_gates_conditional_dependency() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    // Without --editor the conditional edge must not appear.
    gantry()
        .args(["resolve", "EditorTarget", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("MetasoundEditor").not());

    // With --editor it must.
    gantry()
        .args(["resolve", "EditorTarget", "--editor", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("MetasoundEditor"));
}

#[test]
fn test_resolve_json_output() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    gantry()
        .args(["resolve", "SecretIdentity", "--json", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"modules\""))
        .stdout(predicate::str::contains("\"enabled\""));
}

#[test]
fn test_resolve_unknown_target_fails() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    gantry()
        .args(["resolve", "NoSuchTarget", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target"));
}

#[test]
fn test_resolve_missing_module_names_requirer() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(
        &tmp,
        r#"
        [[module]]
        name = "App"
        public_deps = ["Vanished"]

        [[target]]
        name = "App"
        type = "game"
        extra_modules = ["App"]
        "#,
    );

    gantry()
        .args(["resolve", "App", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vanished"))
        .stderr(predicate::str::contains("required by `App`"));
}

#[test]
fn test_resolve_reports_cycle_path() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(
        &tmp,
        r#"
        [[module]]
        name = "A"
        public_deps = ["B"]

        [[module]]
        name = "B"
        public_deps = ["A"]

        [[target]]
        name = "T"
        type = "game"
        extra_modules = ["A"]
        "#,
    );

    gantry()
        .args(["resolve", "T", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle:"))
        .stderr(predicate::str::contains("A"))
        .stderr(predicate::str::contains("B"));
}

// ============================================================================
// gantry check
// ============================================================================

#[test]
fn test_check_reports_all_targets() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    gantry()
        .args(["check", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok    EditorTarget"))
        .stdout(predicate::str::contains("ok    SecretIdentity"))
        .stdout(predicate::str::contains("all 2 targets resolved"));
}

#[test]
fn test_check_isolates_failures() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(
        &tmp,
        r#"
        [[module]]
        name = "Core"

        [[target]]
        name = "Good"
        type = "game"
        extra_modules = ["Core"]

        [[target]]
        name = "Bad"
        type = "program"
        extra_modules = ["Missing"]
        "#,
    );

    gantry()
        .args(["check", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stdout(predicate::str::contains("ok    Good"))
        .stdout(predicate::str::contains("FAIL  Bad"));
}

#[test]
fn test_check_flags_duplicate_declarations() {
    let tmp = TempDir::new().unwrap();
    // The SecretIdentity conflict: same target name, divergent settings.
    let manifest = write_manifest(
        &tmp,
        r#"
        [[module]]
        name = "SecretIdentity"

        [[module]]
        name = "CitySample"

        [[target]]
        name = "SecretIdentity"
        type = "game"
        settings_version = "v5"
        extra_modules = ["SecretIdentity", "CitySample"]

        [[target]]
        name = "SecretIdentity"
        type = "game"
        settings_version = "v4"
        extra_modules = ["SecretIdentity"]
        "#,
    );

    gantry()
        .args(["check", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("SecretIdentity"));
}

#[test]
fn test_check_disabled_plugin_warning() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(
        &tmp,
        r#"
        [[module]]
        name = "Core"

        [[module]]
        name = "Text3D"
        kind = "plugin"
        public_deps = ["Core"]

        [[module]]
        name = "Hud"
        public_deps = ["Text3D"]

        [[target]]
        name = "EditorTarget"
        type = "editor"
        extra_modules = ["Hud"]

        [[target.disable_plugins]]
        when = "all(editor, platform(linux), sanitizer(thread))"
        plugins = ["Text3D"]
        "#,
    );

    gantry()
        .args([
            "check",
            "--platform",
            "linux",
            "--editor",
            "--sanitizer",
            "thread",
            "--manifest",
        ])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 disabled plugins"))
        .stderr(predicate::str::contains("still a structural dependency"));
}

// ============================================================================
// gantry graph
// ============================================================================

#[test]
fn test_graph_prints_tree() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    gantry()
        .args(["graph", "SecretIdentity", "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("├── SecretIdentity"))
        .stdout(predicate::str::contains("Core"));
}

#[test]
fn test_graph_unknown_target_fails() {
    let tmp = TempDir::new().unwrap();
    let manifest = write_manifest(&tmp, SAMPLE);

    gantry()
        .args(["graph", "Ghost", "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ghost"));
}

// ============================================================================
// missing manifest
// ============================================================================

#[test]
fn test_missing_manifest_fails() {
    let tmp = TempDir::new().unwrap();

    gantry()
        .args(["check"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Modules.toml"));
}
