//! Generate command implementation
//!
//! Synthesizes a control rig from a request file or a built-in preset and
//! writes the rig document plus a report.

use anyhow::{Context, Result};
use colored::Colorize;
use rigforge_backend_biped::{summarize, synthesize};
use rigforge_lint::RuleRegistry;
use rigforge_spec::validate_inputs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use crate::input::{load_request, preset_request, RigRequest};
use crate::report::{self, error_codes, ReportMessage, SynthesisReport};

/// Run the generate command
///
/// # Arguments
/// * `request_path` - Path to the request file (JSON), exclusive with `preset`
/// * `preset` - Built-in skeleton preset name, exclusive with `request_path`
/// * `out_dir` - Output directory (default: current directory)
/// * `lint` - Whether to run structural lint on the finished rig
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 success, 1 input error, 2 synthesis error
pub fn run(
    request_path: Option<&str>,
    preset: Option<&str>,
    out_dir: Option<&str>,
    lint: bool,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        run_json(request_path, preset, out_dir, lint)
    } else {
        run_human(request_path, preset, out_dir, lint)
    }
}

fn resolve_request(
    request_path: Option<&str>,
    preset: Option<&str>,
) -> Result<(RigRequest, String)> {
    match (request_path, preset) {
        (Some(path), None) => Ok((load_request(Path::new(path))?, path.to_string())),
        (None, Some(name)) => Ok((preset_request(name)?, format!("preset {}", name))),
        _ => anyhow::bail!("provide exactly one of --request or --preset"),
    }
}

/// Run generate with human-readable (colored) output
fn run_human(
    request_path: Option<&str>,
    preset: Option<&str>,
    out_dir: Option<&str>,
    lint: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let out_dir = Path::new(out_dir.unwrap_or("."));

    let (request, source_label) = resolve_request(request_path, preset)?;

    println!("{} {}", "Generating from:".cyan().bold(), source_label);
    println!("{} {}", "Output directory:".cyan().bold(), out_dir.display());
    println!(
        "{} {} ({} bones, {} meshes)",
        "Skeleton:".dimmed(),
        request.skeleton.name,
        request.skeleton.bones.len(),
        request.meshes.len()
    );

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut synth_report = SynthesisReport::new(&request.skeleton.name);

    let validation = validate_inputs(&request.skeleton, &request.meshes, &request.options);
    synth_report.apply_validation(&validation);
    super::validate::print_validation_results(&validation);

    if !validation.is_ok() {
        synth_report.duration_ms = start.elapsed().as_millis() as u64;
        let report_file = report::report_path(out_dir, &request.skeleton.name);
        report::write_report(&synth_report, &report_file)?;
        println!(
            "\n{} Inputs have {} error(s)",
            "FAILED".red().bold(),
            validation.errors.len()
        );
        return Ok(ExitCode::from(1));
    }

    let rig = match synthesize(&request.skeleton, &request.meshes, &request.options) {
        Ok(rig) => rig,
        Err(e) => {
            synth_report.fail_with(&e);
            synth_report.duration_ms = start.elapsed().as_millis() as u64;
            let report_file = report::report_path(out_dir, &request.skeleton.name);
            report::write_report(&synth_report, &report_file)?;
            println!("\n{} {}", "FAILED".red().bold(), e);
            return Ok(ExitCode::from(2));
        }
    };

    let metrics = summarize(&rig);
    let rig_hash = rig.canonical_hash()?;

    synth_report.input_hash = Some(rig.input_hash.clone());
    synth_report.rig_hash = Some(rig_hash.clone());
    synth_report.metrics = Some(metrics.clone());
    synth_report.notes = rig.notes.clone();

    let rig_file = report::rig_path(out_dir, &request.skeleton.name);
    let rig_json =
        serde_json::to_string_pretty(&rig).context("failed to serialize rig document")?;
    std::fs::write(&rig_file, rig_json)
        .with_context(|| format!("failed to write rig to: {}", rig_file.display()))?;

    if lint {
        let lint_report = RuleRegistry::default_rules().lint(&rig);
        if lint_report.total_issues() == 0 {
            println!("\n{} {}", "Lint:".cyan().bold(), "no issues".green());
        } else {
            println!(
                "\n{} {} issue(s)",
                "Lint:".cyan().bold(),
                lint_report.total_issues()
            );
            super::lint::print_issue_sections(&lint_report);
        }
        synth_report.lint = Some(lint_report);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    synth_report.duration_ms = duration_ms;
    let report_file = report::report_path(out_dir, &request.skeleton.name);
    report::write_report(&synth_report, &report_file)?;

    println!("\n{}", "Rig census:".cyan().bold());
    println!(
        "  Joints:      {} ({} deform)",
        metrics.joint_count, metrics.deform_count
    );
    println!("  Constraints: {}", metrics.constraint_count);
    println!("  Drivers:     {}", metrics.driver_count);
    println!("  Modules:     {}", metrics.module_count);
    println!("  Properties:  {}", metrics.property_count);

    if !rig.notes.is_empty() {
        println!("\n{}", "Notes:".yellow().bold());
        for note in &rig.notes {
            println!("  {} {}", "!".yellow(), note);
        }
    }

    println!("\n{} {}", "Rig written to:".dimmed(), rig_file.display());
    println!("{} {}", "Report written to:".dimmed(), report_file.display());
    println!(
        "\n{} Rig synthesized ({}ms, {})",
        "SUCCESS".green().bold(),
        duration_ms,
        &rig_hash[..16]
    );
    Ok(ExitCode::SUCCESS)
}

/// Run generate with machine-readable JSON output
fn run_json(
    request_path: Option<&str>,
    preset: Option<&str>,
    out_dir: Option<&str>,
    lint: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let out_dir = Path::new(out_dir.unwrap_or("."));

    let (request, _source_label) = match resolve_request(request_path, preset) {
        Ok(pair) => pair,
        Err(e) => {
            let mut synth_report = SynthesisReport::new("");
            synth_report.ok = false;
            synth_report.errors.push(ReportMessage {
                code: error_codes::REQUEST_LOAD.to_string(),
                message: format!("{:#}", e),
                path: request_path.map(|p| p.to_string()),
            });
            print_report_json(&synth_report);
            return Ok(ExitCode::from(1));
        }
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut synth_report = SynthesisReport::new(&request.skeleton.name);

    let validation = validate_inputs(&request.skeleton, &request.meshes, &request.options);
    synth_report.apply_validation(&validation);

    if !validation.is_ok() {
        synth_report.duration_ms = start.elapsed().as_millis() as u64;
        let report_file = report::report_path(out_dir, &request.skeleton.name);
        report::write_report(&synth_report, &report_file)?;
        print_report_json(&synth_report);
        return Ok(ExitCode::from(1));
    }

    let rig = match synthesize(&request.skeleton, &request.meshes, &request.options) {
        Ok(rig) => rig,
        Err(e) => {
            synth_report.fail_with(&e);
            synth_report.duration_ms = start.elapsed().as_millis() as u64;
            let report_file = report::report_path(out_dir, &request.skeleton.name);
            report::write_report(&synth_report, &report_file)?;
            print_report_json(&synth_report);
            return Ok(ExitCode::from(2));
        }
    };

    let metrics = summarize(&rig);
    let rig_hash = rig.canonical_hash()?;

    synth_report.input_hash = Some(rig.input_hash.clone());
    synth_report.rig_hash = Some(rig_hash);
    synth_report.metrics = Some(metrics);
    synth_report.notes = rig.notes.clone();

    let rig_file = report::rig_path(out_dir, &request.skeleton.name);
    let rig_json =
        serde_json::to_string_pretty(&rig).context("failed to serialize rig document")?;
    std::fs::write(&rig_file, rig_json)
        .with_context(|| format!("failed to write rig to: {}", rig_file.display()))?;

    if lint {
        synth_report.lint = Some(RuleRegistry::default_rules().lint(&rig));
    }

    synth_report.duration_ms = start.elapsed().as_millis() as u64;
    let report_file = report::report_path(out_dir, &request.skeleton.name);
    report::write_report(&synth_report, &report_file)?;

    print_report_json(&synth_report);
    Ok(ExitCode::SUCCESS)
}

fn print_report_json(report: &SynthesisReport) {
    let json = serde_json::to_string_pretty(report)
        .expect("SynthesisReport serialization should not fail");
    println!("{}", json);
}
