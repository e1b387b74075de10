//! Full pipeline tests through the command layer.
//!
//! These drive the same entry points the binary dispatches to, with
//! request files written to disk and the rig and report documents read
//! back, so the contract, backend, lint, and CLI crates get exercised
//! as one flow.

use std::process::ExitCode;

use pretty_assertions::assert_eq;
use rigforge_backend_biped::ControlRig;
use rigforge_cli::commands::lint::OutputFormat;
use rigforge_cli::commands::{generate, lint, validate};
use rigforge_cli::input::preset_request;
use rigforge_cli::report::{report_path, rig_path, SynthesisReport};
use rigforge_spec::RigOptions;

// ============================================================================
// Generate, then lint the artifact
// ============================================================================

/// A request file round-trips through generate, and the rig document it
/// writes passes a strict lint from a separate invocation.
#[test]
fn test_generate_then_lint_the_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let request = preset_request("biped_v1").unwrap();
    let request_file = tmp.path().join("request.json");
    std::fs::write(
        &request_file,
        serde_json::to_string_pretty(&request).unwrap(),
    )
    .unwrap();

    let out_dir = tmp.path().join("out");
    let code = generate::run(
        Some(request_file.to_str().unwrap()),
        None,
        Some(out_dir.to_str().unwrap()),
        false,
        false,
    )
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let rig_file = rig_path(&out_dir, "biped_v1");
    let rig: ControlRig =
        serde_json::from_str(&std::fs::read_to_string(&rig_file).unwrap()).unwrap();
    assert_eq!(rig.modules.len(), 12);

    let lint_code = lint::run(
        rig_file.to_str().unwrap(),
        true,
        &[],
        None,
        OutputFormat::Text,
    )
    .unwrap();
    assert_eq!(lint_code, ExitCode::SUCCESS);
}

/// The report's hashes agree with the rig document sitting next to it.
#[test]
fn test_report_hashes_match_the_rig_file() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();

    let code = generate::run(None, Some("biped_v1"), Some(out), true, false).unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let report: SynthesisReport = serde_json::from_str(
        &std::fs::read_to_string(report_path(tmp.path(), "biped_v1")).unwrap(),
    )
    .unwrap();
    assert!(report.ok);
    assert_eq!(report.metrics.as_ref().map(|m| m.module_count), Some(12));
    let lint_report = report.lint.expect("lint embedded in report");
    assert!(lint_report.ok);

    let rig: ControlRig = serde_json::from_str(
        &std::fs::read_to_string(rig_path(tmp.path(), "biped_v1")).unwrap(),
    )
    .unwrap();
    assert_eq!(Some(rig.canonical_hash().unwrap()), report.rig_hash);
    assert_eq!(Some(rig.input_hash), report.input_hash);
}

// ============================================================================
// Validation failures
// ============================================================================

/// A stampless request fails validation with the stamp code and still
/// leaves a report next to the request file.
#[test]
fn test_validate_flags_a_stampless_request() {
    let tmp = tempfile::tempdir().unwrap();
    let mut request = preset_request("biped_v1").unwrap();
    request.skeleton.stamp = None;
    let request_file = tmp.path().join("request.json");
    std::fs::write(
        &request_file,
        serde_json::to_string_pretty(&request).unwrap(),
    )
    .unwrap();

    let code = validate::run(request_file.to_str().unwrap(), false).unwrap();
    assert_eq!(code, ExitCode::from(1));

    let report: SynthesisReport = serde_json::from_str(
        &std::fs::read_to_string(report_path(tmp.path(), "biped_v1")).unwrap(),
    )
    .unwrap();
    assert!(!report.ok);
    assert!(report.errors.iter().any(|e| e.code == "E001"));
}

// ============================================================================
// Options travel the whole pipe
// ============================================================================

/// Options in the request file reach the finished document: a minimal
/// request produces a rig without the optional modules.
#[test]
fn test_request_options_reach_the_document() {
    let tmp = tempfile::tempdir().unwrap();
    let mut request = preset_request("biped_v1").unwrap();
    request.options = RigOptions::minimal();
    let request_file = tmp.path().join("request.json");
    std::fs::write(
        &request_file,
        serde_json::to_string_pretty(&request).unwrap(),
    )
    .unwrap();

    let out_dir = tmp.path().join("out");
    let code = generate::run(
        Some(request_file.to_str().unwrap()),
        None,
        Some(out_dir.to_str().unwrap()),
        false,
        false,
    )
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let rig: ControlRig = serde_json::from_str(
        &std::fs::read_to_string(rig_path(&out_dir, "biped_v1")).unwrap(),
    )
    .unwrap();
    assert!(rig.module("face").is_none());
    assert!(rig.module("springs").is_none());
    assert!(rig.module("fingers_l").is_none());
    assert!(rig.module("fingers_r").is_none());
    assert!(rig.module("arm_l").is_some());
    assert!(rig.module("leg_r").is_some());
    assert!(rig
        .joints
        .iter()
        .all(|j| !j.name.starts_with("twist_")));
}
