//! Lint command implementation
//!
//! Runs structural lint rules on a generated rig document.

use anyhow::{Context, Result};
use colored::Colorize;
use rigforge_lint::{LintIssue, LintReport, RuleRegistry, Severity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::ExitCode;

/// Output format for lint results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown format '{}', expected 'text' or 'json'", s)),
        }
    }
}

/// JSON output for lint command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintOutput {
    /// Whether the lint passed (no errors).
    pub success: bool,
    /// Path to the linted rig document.
    pub rig_path: String,
    /// The lint report with all issues.
    pub report: LintReport,
}

/// Run the lint command.
///
/// # Arguments
/// * `input` - Path to the rig document to lint (JSON)
/// * `strict` - Whether to fail on warnings (in addition to errors)
/// * `disable_rules` - Rule IDs to disable
/// * `only_rules` - If provided, only run these rules (comma-separated)
/// * `format` - Output format (text or json)
///
/// # Returns
/// Exit code: 0 if passed, 1 if errors (or warnings in strict mode)
pub fn run(
    input: &str,
    strict: bool,
    disable_rules: &[String],
    only_rules: Option<&str>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let rig_path = Path::new(input);

    if !rig_path.exists() {
        if format == OutputFormat::Json {
            let mut report = LintReport::new();
            report.add_issue(LintIssue::new(
                "lint/file-not-found",
                Severity::Error,
                format!("File not found: {}", input),
                "Check the file path and try again.",
            ));
            let output = LintOutput {
                success: false,
                rig_path: input.to_string(),
                report,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&output)
                    .expect("LintOutput serialization should not fail")
            );
        } else {
            eprintln!("{}: File not found: {}", "error".red().bold(), input);
        }
        return Ok(ExitCode::from(1));
    }

    let mut registry = RuleRegistry::default_rules();

    for rule_id in disable_rules {
        registry.disable_rule(rule_id);
    }

    if let Some(only) = only_rules {
        let rules: Vec<&str> = only.split(',').map(|s| s.trim()).collect();
        registry.enable_only(&rules);
    }

    let report = registry
        .lint_file(rig_path)
        .with_context(|| format!("failed to lint file: {}", input))?;

    let success = if strict {
        report.ok && !report.has_warnings()
    } else {
        report.ok
    };

    if format == OutputFormat::Json {
        let output = LintOutput {
            success,
            rig_path: input.to_string(),
            report,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output)
                .expect("LintOutput serialization should not fail")
        );
    } else {
        print_text_output(input, &report, strict);
    }

    if success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Lists every registered rule with its default severity.
pub fn list_rules(format: OutputFormat) -> Result<ExitCode> {
    let metadata = RuleRegistry::default_rules().rule_metadata();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&metadata)
                    .expect("RuleMetadata serialization should not fail")
            );
        }
        OutputFormat::Text => {
            println!("{}", "Registered rules:".cyan().bold());
            for rule in &metadata {
                let severity = match rule.severity {
                    Severity::Error => "error".red(),
                    Severity::Warning => "warning".yellow(),
                    Severity::Info => "info".blue(),
                };
                println!("  {} [{}] {}", rule.id.cyan(), severity, rule.description);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Print lint results in human-readable text format.
fn print_text_output(input: &str, report: &LintReport, strict: bool) {
    println!("{} {}", "Linting:".cyan().bold(), input);

    if report.total_issues() == 0 {
        println!("\n{} No issues found", "PASSED".green().bold());
        return;
    }

    print_issue_sections(report);

    let summary = format!(
        "{} error(s), {} warning(s), {} info",
        report.summary.errors, report.summary.warnings, report.summary.info
    );

    if report.ok && (!strict || !report.has_warnings()) {
        println!("\n{} {}", "PASSED".green().bold(), summary.dimmed());
    } else {
        println!("\n{} {}", "FAILED".red().bold(), summary.dimmed());
    }
}

/// Print the error, warning, and info sections of a report.
pub(crate) fn print_issue_sections(report: &LintReport) {
    if !report.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for issue in &report.errors {
            print_lint_issue(issue, "x".red());
        }
    }

    if !report.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for issue in &report.warnings {
            print_lint_issue(issue, "!".yellow());
        }
    }

    if !report.info.is_empty() {
        println!("\n{}", "Info:".blue().bold());
        for issue in &report.info {
            print_lint_issue(issue, "i".blue());
        }
    }
}

/// Print a single lint issue.
fn print_lint_issue(issue: &LintIssue, marker: colored::ColoredString) {
    let location = issue
        .location
        .as_ref()
        .map(|l| format!(" at {}", l))
        .unwrap_or_default();

    println!(
        "  {} [{}]{}: {}",
        marker,
        issue.rule_id.cyan(),
        location.dimmed(),
        issue.message
    );

    if let Some(actual) = &issue.actual_value {
        if let Some(expected) = &issue.expected_range {
            println!(
                "    {} actual={}, expected={}",
                "->".dimmed(),
                actual,
                expected
            );
        } else {
            println!("    {} actual={}", "->".dimmed(), actual);
        }
    }

    println!("    {} {}", "suggestion:".dimmed(), issue.suggestion);
}
