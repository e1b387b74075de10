//! Batch validation command
//!
//! Validates every request file under a directory and writes a summary report.

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use walkdir::WalkDir;

use crate::commands::validate;

/// Run batch validation
pub fn run(dir: &str, out_root: Option<&str>) -> Result<ExitCode> {
    let out_dir = PathBuf::from(out_root.unwrap_or("batch-validation"));
    std::fs::create_dir_all(&out_dir)?;

    let requests: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_request_file(p))
        .collect();

    if requests.is_empty() {
        println!("No request files found under: {}", dir);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Batch validating {} request(s)...", requests.len());
    println!("Output directory: {}", out_dir.display());

    let mut results = Vec::new();
    let mut passed = 0;
    let mut failed = 0;
    let batch_start = Instant::now();

    for (i, request_path) in requests.iter().enumerate() {
        let item_start = Instant::now();
        let progress = format!("[{}/{}]", i + 1, requests.len()).cyan().bold();
        println!("\n{} {}", progress, request_path.display());

        let failure = match validate::run(request_path.to_str().unwrap(), false) {
            Ok(ExitCode::SUCCESS) => None,
            Ok(code) => Some(format!("exit code: {:?}", code)),
            Err(e) => Some(e.to_string()),
        };
        let time_str = format!("{:.1}s", item_start.elapsed().as_secs_f64()).dimmed();

        match &failure {
            None => {
                passed += 1;
                println!("  {} {}", "PASS".green().bold(), time_str);
            }
            Some(reason) => {
                failed += 1;
                println!("  {} {} {}", "FAIL".red().bold(), time_str, reason);
            }
        }
        results.push(BatchResult {
            request: request_path.to_string_lossy().to_string(),
            success: failure.is_none(),
            error: failure,
        });
    }

    let batch_report = BatchReport {
        total: requests.len(),
        passed,
        failed,
        results,
    };

    let report_path = out_dir.join("batch-report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&batch_report)?)?;

    let total_elapsed = batch_start.elapsed().as_secs_f64();
    let counts = format!(
        "{} passed, {} failed of {}",
        if failed == 0 {
            passed.to_string().green()
        } else {
            passed.to_string().normal()
        },
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        },
        requests.len()
    );
    println!("\n{}", "=".repeat(60));
    println!(
        "{} {} ({:.1}s total, {:.1}s avg)",
        "Batch validation:".bold(),
        counts,
        total_elapsed,
        total_elapsed / requests.len() as f64
    );
    println!("Report: {}", report_path.display());

    if failed > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// A request file is any .json that is not one of our own outputs.
fn is_request_file(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            name.ends_with(".json")
                && !name.ends_with(".report.json")
                && !name.ends_with(".rig.json")
                && name != "batch-report.json"
        }
        None => false,
    }
}

#[derive(Debug, serde::Serialize)]
struct BatchReport {
    total: usize,
    passed: usize,
    failed: usize,
    results: Vec<BatchResult>,
}

#[derive(Debug, serde::Serialize)]
struct BatchResult {
    request: String,
    success: bool,
    error: Option<String>,
}
