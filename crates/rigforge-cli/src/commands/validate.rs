//! Validate command implementation
//!
//! Checks a request file against the input contract and writes a report.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use rigforge_spec::hash::canonical_input_hash;
use rigforge_spec::{validate_inputs, ValidationResult};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use crate::input::load_request;
use crate::report::{self, error_codes, ReportMessage, SynthesisReport};

/// Run the validate command
///
/// # Arguments
/// * `request_path` - Path to the request file (JSON)
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(request_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(request_path)
    } else {
        run_human(request_path)
    }
}

/// Run validate with human-readable (colored) output
fn run_human(request_path: &str) -> Result<ExitCode> {
    let start = Instant::now();

    println!("{} {}", "Validating:".cyan().bold(), request_path);

    let request = load_request(Path::new(request_path))?;
    println!(
        "{} {} ({} bones, {} meshes)",
        "Skeleton:".dimmed(),
        request.skeleton.name,
        request.skeleton.bones.len(),
        request.meshes.len()
    );

    let result = validate_inputs(&request.skeleton, &request.meshes, &request.options);
    let duration_ms = start.elapsed().as_millis() as u64;

    let mut synth_report = SynthesisReport::new(&request.skeleton.name);
    synth_report.apply_validation(&result);
    synth_report.duration_ms = duration_ms;
    synth_report.input_hash =
        canonical_input_hash(&request.skeleton, &request.meshes, &request.options).ok();

    let out_dir = Path::new(request_path).parent().unwrap_or(Path::new("."));
    let report_file = report::report_path(out_dir, &request.skeleton.name);
    report::write_report(&synth_report, &report_file)?;

    print_validation_results(&result);
    println!("\n{} {}", "Report written to:".dimmed(), report_file.display());

    if result.is_ok() {
        println!(
            "\n{} Inputs are valid ({}ms)",
            "SUCCESS".green().bold(),
            duration_ms
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} Inputs have {} error(s) ({}ms)",
            "FAILED".red().bold(),
            result.errors.len(),
            duration_ms
        );
        Ok(ExitCode::from(1))
    }
}

/// Run validate with machine-readable JSON output
fn run_json(request_path: &str) -> Result<ExitCode> {
    let start = Instant::now();

    let request = match load_request(Path::new(request_path)) {
        Ok(request) => request,
        Err(e) => {
            let mut synth_report = SynthesisReport::new("");
            synth_report.ok = false;
            synth_report.errors.push(ReportMessage {
                code: error_codes::REQUEST_LOAD.to_string(),
                message: format!("{:#}", e),
                path: Some(request_path.to_string()),
            });
            print_report_json(&synth_report);
            return Ok(ExitCode::from(1));
        }
    };

    let result = validate_inputs(&request.skeleton, &request.meshes, &request.options);
    let duration_ms = start.elapsed().as_millis() as u64;

    let mut synth_report = SynthesisReport::new(&request.skeleton.name);
    synth_report.apply_validation(&result);
    synth_report.duration_ms = duration_ms;
    synth_report.input_hash =
        canonical_input_hash(&request.skeleton, &request.meshes, &request.options).ok();

    // Still write the report file for consistency with human mode.
    let out_dir = Path::new(request_path).parent().unwrap_or(Path::new("."));
    let report_file = report::report_path(out_dir, &request.skeleton.name);
    report::write_report(&synth_report, &report_file)?;

    print_report_json(&synth_report);

    if synth_report.ok {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Print validation results to the console
pub(crate) fn print_validation_results(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &result.errors {
            print_issue(
                "x".red(),
                error.code.to_string().red(),
                &error.path,
                &error.message,
            );
        }
    }

    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            print_issue(
                "!".yellow(),
                warning.code.to_string().yellow(),
                &warning.path,
                &warning.message,
            );
        }
    }
}

fn print_issue(glyph: ColoredString, code: ColoredString, path: &Option<String>, message: &str) {
    let location = path
        .as_deref()
        .map(|p| format!(" at {}", p))
        .unwrap_or_default();
    println!("  {} [{}]{}: {}", glyph, code, location.dimmed(), message);
}

fn print_report_json(report: &SynthesisReport) {
    let json = serde_json::to_string_pretty(report)
        .expect("SynthesisReport serialization should not fail");
    println!("{}", json);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{preset_request, RigRequest};

    fn write_request(dir: &tempfile::TempDir, filename: &str, request: &RigRequest) -> String {
        let path = dir.path().join(filename);
        std::fs::write(&path, serde_json::to_string_pretty(request).unwrap()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn validate_passes_reference_request_and_writes_report() {
        let tmp = tempfile::tempdir().unwrap();
        let request = preset_request("biped_v1").unwrap();
        let path = write_request(&tmp, "request.json", &request);

        let code = run(&path, false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let report_file = report::report_path(tmp.path(), "biped_v1");
        let json = std::fs::read_to_string(&report_file).unwrap();
        let synth_report: SynthesisReport = serde_json::from_str(&json).unwrap();
        assert!(synth_report.ok);
        assert!(synth_report.errors.is_empty());
        assert_eq!(synth_report.input_hash.map(|h| h.len()), Some(64));
    }

    #[test]
    fn validate_fails_on_missing_meshes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut request = preset_request("biped_v1").unwrap();
        request.meshes.clear();
        let path = write_request(&tmp, "request.json", &request);

        let code = run(&path, false).unwrap();
        assert_eq!(code, ExitCode::from(1));

        let report_file = report::report_path(tmp.path(), "biped_v1");
        let json = std::fs::read_to_string(&report_file).unwrap();
        let synth_report: SynthesisReport = serde_json::from_str(&json).unwrap();
        assert!(!synth_report.ok);
        assert!(synth_report.errors.iter().any(|e| e.code == "E010"));
    }

    #[test]
    fn validate_json_output_success() {
        let tmp = tempfile::tempdir().unwrap();
        let request = preset_request("biped_v1").unwrap();
        let path = write_request(&tmp, "request.json", &request);

        let code = run(&path, true).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn validate_json_output_missing_file() {
        let code = run("/nonexistent/request.json", true).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }
}
