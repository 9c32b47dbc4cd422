//! Integration tests for the DXT CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.
//! Every command runs with DXT_DATA_DIR and HOME pointed into a temp
//! directory so the real context store and config are never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DESIGN_ID: &str = "8f2b5c1a-4d7e-4b3a-9c6f-2e8d1a7b5c43";

/// Helper to get a dxt command
fn dxt() -> Command {
    Command::cargo_bin("dxt").unwrap()
}

/// Helper to get a dxt command isolated inside a temp directory
fn dxt_in(data: &TempDir) -> Command {
    let mut cmd = dxt();
    cmd.env("DXT_DATA_DIR", data.path())
        .env("HOME", data.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("DXT_DEFAULT_ROOT");
    cmd
}

/// A small two-component design: a visible box and, in a translated
/// occurrence, a visible cylinder, plus one hidden body.
fn design_json(title: &str, id: Option<&str>) -> serde_json::Value {
    let mut doc = serde_json::json!({
        "title": title,
        "parameters": [
            { "name": "arm_length", "value": 25.0, "unit": "mm" },
            { "name": "base_width", "value": 40.0 }
        ],
        "timeline": {
            "entries": [
                { "name": "Base", "operation": "extrude" },
                { "name": "Arm", "operation": "revolve" },
                { "name": "Pin hole", "operation": "cut" }
            ],
            "position": 3
        },
        "root": {
            "name": "Bracket",
            "bodies": [
                { "name": "Base", "shape": { "kind": "box", "size": [40.0, 10.0, 20.0] } },
                { "name": "Scrap", "visible": false, "shape": { "kind": "box", "size": [5.0, 5.0, 5.0] } }
            ],
            "occurrences": [
                {
                    "translation": [0.0, 0.0, 15.0],
                    "component": {
                        "name": "Arm",
                        "bodies": [
                            { "name": "Pin", "shape": { "kind": "cylinder", "radius": 3.0, "height": 25.0 } }
                        ]
                    }
                }
            ]
        }
    });
    if let Some(id) = id {
        doc["design_id"] = serde_json::json!(id);
    }
    doc
}

fn write_design(path: &Path, doc: &serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
}

/// Helper to run a first export with prompts answered via flags
fn export_design(data: &TempDir, design: &Path, base: &Path, name: &str) -> assert_cmd::assert::Assert {
    dxt_in(data)
        .arg("export")
        .arg(design)
        .arg("--root")
        .arg(base)
        .args(["--name", name, "--yes"])
        .assert()
}

/// Helper to set up a temp dir with a design file and an exported project
fn setup_exported() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", Some(DESIGN_ID)));
    let base = tmp.path().join("exports");
    export_design(&tmp, &design, &base, "Bracket").success();
    (tmp, design, base.join("Bracket"))
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    dxt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drydock Export Toolkit"));
}

#[test]
fn test_version_displays() {
    dxt()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dxt"));
}

#[test]
fn test_unknown_command_fails() {
    dxt()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Export Command Tests
// ============================================================================

#[test]
fn test_export_initializes_project_layout() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", Some(DESIGN_ID)));
    let base = tmp.path().join("exports");

    export_design(&tmp, &design, &base, "Bracket")
        .success()
        .stdout(predicate::str::contains("Project set up"))
        .stdout(predicate::str::contains("Bracket_v01"));

    let root = base.join("Bracket");
    assert!(root.join("CAD/v01/Bracket_v01.dsn.json").is_file());
    assert!(root.join("CAD/v01/Bracket_v01.obj").is_file());
    assert!(root.join("Models/Bracket_Base.stl").is_file());
    assert!(root.join("Models/Bracket_Arm_Pin.stl").is_file());
    assert!(root.join("_preview.png").is_file());

    // hidden bodies are not exported
    let meshes: Vec<_> = fs::read_dir(root.join("Models")).unwrap().collect();
    assert_eq!(meshes.len(), 2);
}

#[test]
fn test_export_increments_version() {
    let (tmp, design, root) = setup_exported();

    // Unchanged design, so --force is needed for a second snapshot
    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported Bracket_v02"));

    assert!(root.join("CAD/v01/Bracket_v01.dsn.json").is_file());
    assert!(root.join("CAD/v02/Bracket_v02.dsn.json").is_file());
    assert!(root.join("CAD/v02/Bracket_v02.obj").is_file());
}

#[test]
fn test_export_skips_when_unchanged() {
    let (tmp, design, root) = setup_exported();

    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes since last export"));

    // still only the one version folder
    let versions: Vec<_> = fs::read_dir(root.join("CAD")).unwrap().collect();
    assert_eq!(versions.len(), 1);
}

#[test]
fn test_export_detects_change() {
    let (tmp, design, root) = setup_exported();

    // Adding a parameter changes the fingerprint
    let mut doc = design_json("Bracket v3", Some(DESIGN_ID));
    doc["parameters"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "name": "pin_fit", "value": 0.05 }));
    write_design(&design, &doc);

    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported Bracket_v02"));

    assert!(root.join("CAD/v02/Bracket_v02.obj").is_file());
}

#[test]
fn test_incomplete_snapshot_is_retried() {
    let (tmp, design, root) = setup_exported();

    let mut doc = design_json("Bracket v3", Some(DESIGN_ID));
    doc["parameters"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "name": "pin_fit", "value": 0.05 }));
    write_design(&design, &doc);

    // A stray file sits where the v02 folder should go: the version
    // scan ignores it, both versioned writes then fail against it,
    // and the rest of the pass still runs.
    let squatter = root.join("CAD/v02");
    fs::write(&squatter, b"not a folder").unwrap();

    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("incomplete"));

    // The stored fingerprint did not advance, so the design still
    // reads as changed instead of skipping.
    dxt_in(&tmp)
        .arg("status")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("changed since last export"));

    fs::remove_file(&squatter).unwrap();

    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported Bracket_v02"));

    assert!(root.join("CAD/v02/Bracket_v02.obj").is_file());
}

#[test]
fn test_export_reinit_sets_up_new_location() {
    let (tmp, design, _root) = setup_exported();
    let other = tmp.path().join("elsewhere");

    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .arg("--reinit")
        .arg("--root")
        .arg(&other)
        .args(["--name", "BracketB", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project set up"));

    assert!(other.join("BracketB/CAD/v01/BracketB_v01.dsn.json").is_file());
}

#[test]
fn test_export_resumes_numbering_after_manual_versions() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", Some(DESIGN_ID)));
    let base = tmp.path().join("exports");

    // Hand-made version folders from before the tool was in use
    fs::create_dir_all(base.join("Bracket/CAD/v07")).unwrap();
    fs::create_dir_all(base.join("Bracket/CAD/notes")).unwrap();

    export_design(&tmp, &design, &base, "Bracket")
        .success()
        .stdout(predicate::str::contains("Bracket_v08"));

    assert!(base.join("Bracket/CAD/v08/Bracket_v08.obj").is_file());
}

#[test]
fn test_export_sanitizes_project_name() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("clamp.dsn.json");
    write_design(&design, &design_json("Clamp <Rev/2>", None));
    let base = tmp.path().join("exports");

    export_design(&tmp, &design, &base, "Clamp <Rev/2>").success();

    assert!(base.join("Clamp _Rev_2_/CAD/v01").is_dir());
}

#[test]
fn test_export_json_report() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", Some(DESIGN_ID)));
    let base = tmp.path().join("exports");

    let output = dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .arg("--root")
        .arg(&base)
        .args(["--name", "Bracket", "--yes", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["version"], "v01");
    assert_eq!(report["versioned_name"], "Bracket_v01");
    assert_eq!(report["meshes_exported"], 2);
    assert_eq!(report["artifacts"].as_array().unwrap().len(), 3);
}

#[test]
fn test_export_migrates_record_to_design_id() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", None));
    let base = tmp.path().join("exports");
    export_design(&tmp, &design, &base, "Bracket").success();

    // The design gains a session id and a change; the record should
    // move from the name key to the id key.
    let mut doc = design_json("Bracket v3", Some(DESIGN_ID));
    doc["parameters"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "name": "pin_fit", "value": 0.05 }));
    write_design(&design, &doc);

    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported Bracket_v02"));

    let output = dxt_in(&tmp).args(["list", "-f", "json"]).output().unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["key"], DESIGN_ID);
    assert_eq!(rows[0]["project_name"], "Bracket");
}

#[test]
fn test_reinit_migrates_record_to_design_id() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", None));
    let base = tmp.path().join("exports");
    export_design(&tmp, &design, &base, "Bracket").success();

    // The design gains a session id; pointing it at a new location
    // must not leave the old name-keyed record behind.
    write_design(&design, &design_json("Bracket v3", Some(DESIGN_ID)));
    let other = tmp.path().join("elsewhere");
    dxt_in(&tmp)
        .arg("export")
        .arg(&design)
        .arg("--reinit")
        .arg("--root")
        .arg(&other)
        .args(["--name", "Bracket", "--yes"])
        .assert()
        .success();

    let output = dxt_in(&tmp).args(["list", "-f", "json"]).output().unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["key"], DESIGN_ID);
    assert_eq!(rows[0]["root"], other.join("Bracket").to_str().unwrap());
}

#[test]
fn test_export_missing_design_fails() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .arg("export")
        .arg(tmp.path().join("nope.dsn.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read"));
}

// ============================================================================
// Status Command Tests
// ============================================================================

#[test]
fn test_status_unknown_design() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("bracket.dsn.json");
    write_design(&design, &design_json("Bracket v3", Some(DESIGN_ID)));

    dxt_in(&tmp)
        .arg("status")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("not remembered"));
}

#[test]
fn test_status_after_export() {
    let (tmp, design, _root) = setup_exported();

    dxt_in(&tmp)
        .arg("status")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("Bracket"))
        .stdout(predicate::str::contains("unchanged"));
}

#[test]
fn test_status_detects_change() {
    let (tmp, design, _root) = setup_exported();

    let mut doc = design_json("Bracket v3", Some(DESIGN_ID));
    doc["parameters"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "name": "pin_fit", "value": 0.05 }));
    write_design(&design, &doc);

    dxt_in(&tmp)
        .arg("status")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("changed since last export"))
        .stdout(predicate::str::contains("Bracket_v02"));
}

#[test]
fn test_status_json() {
    let (tmp, design, _root) = setup_exported();

    let output = dxt_in(&tmp)
        .args(["status", "-f", "json"])
        .arg(&design)
        .output()
        .unwrap();
    assert!(output.status.success());

    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["fingerprint"], "3/3/1/2/3");
    assert_eq!(status["context"]["project"], "Bracket");
    assert_eq!(status["context"]["changed"], false);
    assert_eq!(status["context"]["last_version"], 1);
}

// ============================================================================
// List and Forget Command Tests
// ============================================================================

#[test]
fn test_list_empty() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No designs remembered"));
}

#[test]
fn test_list_shows_designs() {
    let (tmp, _design, _root) = setup_exported();

    dxt_in(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bracket"))
        .stdout(predicate::str::contains("v01"))
        .stdout(predicate::str::contains("1 design(s) remembered"));
}

#[test]
fn test_list_and_status_handle_multibyte_names() {
    let tmp = TempDir::new().unwrap();
    let design = tmp.path().join("teil.dsn.json");
    // 13 characters, 26 bytes: long enough to hit the display
    // truncation with a character straddling the cut
    let name = "ä".repeat(13);
    write_design(&design, &design_json(&name, None));
    let base = tmp.path().join("exports");
    export_design(&tmp, &design, &base, &name).success();

    dxt_in(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(name.clone()))
        .stdout(predicate::str::contains("1 design(s) remembered"));

    dxt_in(&tmp)
        .arg("status")
        .arg(&design)
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));
}

#[test]
fn test_forget_by_project_name() {
    let (tmp, _design, _root) = setup_exported();

    dxt_in(&tmp)
        .args(["forget", "Bracket"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forgot"));

    dxt_in(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No designs remembered"));
}

#[test]
fn test_forget_unknown_fails() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .args(["forget", "nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remembered design"));
}

// ============================================================================
// Exported Artifact Tests
// ============================================================================

#[test]
fn test_exported_obj_parses() {
    let (_tmp, _design, root) = setup_exported();
    let obj_path = root.join("CAD/v01/Bracket_v01.obj");

    let (models, _materials) = tobj::load_obj(
        &obj_path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(models.len(), 2);
    assert!(models.iter().any(|m| m.name == "Bracket_Base"));
    assert!(models.iter().any(|m| m.name == "Bracket_Arm_Pin"));
    for model in &models {
        assert!(!model.mesh.positions.is_empty());
        assert_eq!(model.mesh.indices.len() % 3, 0);
    }
}

#[test]
fn test_exported_stl_parses() {
    let (_tmp, _design, root) = setup_exported();
    let stl_path = root.join("Models/Bracket_Base.stl");

    let mut reader = BufReader::new(fs::File::open(stl_path).unwrap());
    let mesh = stl_io::read_stl(&mut reader).unwrap();

    // a box tessellates to 12 triangles
    assert_eq!(mesh.faces.len(), 12);
    assert_eq!(mesh.vertices.len(), 8);
}

#[test]
fn test_exported_preview_is_png() {
    let (_tmp, _design, root) = setup_exported();

    let image = image::open(root.join("_preview.png")).unwrap().to_rgba8();
    assert_eq!(image.width(), 400);
    assert_eq!(image.height(), 400);
}

#[test]
fn test_exported_archive_reloads() {
    let (tmp, _design, root) = setup_exported();
    let archive = root.join("CAD/v01/Bracket_v01.dsn.json");

    // The archived copy is itself a loadable design
    dxt_in(&tmp)
        .arg("status")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Bracket"));
}

// ============================================================================
// Config and Completions Tests
// ============================================================================

#[test]
fn test_config_keys_lists_all() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_root"))
        .stdout(predicate::str::contains("mesh_refinement"))
        .stdout(predicate::str::contains("preview_size"));
}

#[test]
fn test_config_set_and_show() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .args(["config", "set", "mesh_refinement", "low"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set"));

    dxt_in(&tmp)
        .args(["config", "show", "mesh_refinement"])
        .assert()
        .success()
        .stdout(predicate::str::contains("low"));
}

#[test]
fn test_config_set_rejects_bad_value() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .args(["config", "set", "preview_size", "huge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a number"));
}

#[test]
fn test_config_set_rejects_oversized_preview() {
    let tmp = TempDir::new().unwrap();

    dxt_in(&tmp)
        .args(["config", "set", "preview_size", "2000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 16 and 4096"));

    dxt_in(&tmp)
        .args(["config", "set", "preview_size", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 16 and 4096"));
}

#[test]
fn test_completions_generate() {
    dxt()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dxt"));
}
