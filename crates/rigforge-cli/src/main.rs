//! Rigforge CLI - Command-line interface for procedural rig synthesis

use clap::{Parser, Subcommand};
use rigforge_cli::commands;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rigforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rig request file without synthesizing
    Validate {
        /// Path to the request file (.json)
        #[arg(short, long)]
        request: String,

        /// Output the validation report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Synthesize a control rig from a request file or a skeleton preset
    Generate {
        /// Path to the request file (.json)
        #[arg(short, long)]
        request: Option<String>,

        /// Skeleton preset name (e.g. biped_v1)
        #[arg(short, long)]
        preset: Option<String>,

        /// Output directory for the rig and report
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Lint the synthesized rig and embed the result in the report
        #[arg(long)]
        lint: bool,

        /// Output the synthesis report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Lint a synthesized rig file
    Lint {
        /// Path to the rig file (.rig.json)
        #[arg(short, long)]
        input: String,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,

        /// Disable a specific rule (can be repeated)
        #[arg(long = "disable-rule", value_name = "RULE_ID")]
        disable_rules: Vec<String>,

        /// Run only these rules (comma-separated)
        #[arg(long = "only-rules", value_name = "RULE_IDS")]
        only_rules: Option<String>,

        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// List the lint rules and their default severities
    Rules {
        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Validate every request file under a directory
    BatchValidate {
        /// Directory to scan for request files
        #[arg(short, long)]
        dir: String,

        /// Output directory for the batch report
        #[arg(short, long)]
        out_dir: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Validate { request, json } => commands::validate::run(request, *json),
        Commands::Generate {
            request,
            preset,
            out_dir,
            lint,
            json,
        } => commands::generate::run(
            request.as_deref(),
            preset.as_deref(),
            out_dir.as_deref(),
            *lint,
            *json,
        ),
        Commands::Lint {
            input,
            strict,
            disable_rules,
            only_rules,
            format,
        } => {
            let output_format = format
                .parse::<commands::lint::OutputFormat>()
                .expect("clap should have validated format");
            commands::lint::run(
                input,
                *strict,
                disable_rules,
                only_rules.as_deref(),
                output_format,
            )
        }
        Commands::Rules { format } => {
            let output_format = format
                .parse::<commands::lint::OutputFormat>()
                .expect("clap should have validated format");
            commands::lint::list_rules(output_format)
        }
        Commands::BatchValidate { dir, out_dir } => {
            commands::batch_validate::run(dir, out_dir.as_deref())
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from(["rigforge", "validate", "--request", "rig.json"]).unwrap();
        match cli.command {
            Commands::Validate { request, json } => {
                assert_eq!(request, "rig.json");
                assert!(!json);
            }
            _ => panic!("expected Validate command"),
        }
    }

    #[test]
    fn test_cli_validate_json_flag() {
        let cli = Cli::try_parse_from(["rigforge", "validate", "-r", "rig.json", "--json"])
            .unwrap();
        match cli.command {
            Commands::Validate { json, .. } => assert!(json),
            _ => panic!("expected Validate command"),
        }
    }

    #[test]
    fn test_cli_validate_requires_request() {
        let result = Cli::try_parse_from(["rigforge", "validate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_generate_preset() {
        let cli = Cli::try_parse_from([
            "rigforge", "generate", "--preset", "biped_v1", "--out-dir", "out",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                request,
                preset,
                out_dir,
                lint,
                json,
            } => {
                assert_eq!(request, None);
                assert_eq!(preset.as_deref(), Some("biped_v1"));
                assert_eq!(out_dir.as_deref(), Some("out"));
                assert!(!lint);
                assert!(!json);
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parses_generate_lint_flag() {
        let cli = Cli::try_parse_from([
            "rigforge", "generate", "--request", "req.json", "--lint",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { request, lint, .. } => {
                assert_eq!(request.as_deref(), Some("req.json"));
                assert!(lint);
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parses_lint_defaults() {
        let cli = Cli::try_parse_from(["rigforge", "lint", "--input", "out/rig.rig.json"]).unwrap();
        match cli.command {
            Commands::Lint {
                input,
                strict,
                disable_rules,
                only_rules,
                format,
            } => {
                assert_eq!(input, "out/rig.rig.json");
                assert!(!strict);
                assert!(disable_rules.is_empty());
                assert_eq!(only_rules, None);
                assert_eq!(format, "text");
            }
            _ => panic!("expected Lint command"),
        }
    }

    #[test]
    fn test_cli_parses_lint_repeated_disable_rule() {
        let cli = Cli::try_parse_from([
            "rigforge",
            "lint",
            "--input",
            "rig.rig.json",
            "--disable-rule",
            "graph/parent-cycle",
            "--disable-rule",
            "wiring/switch-overlap",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Lint {
                strict,
                disable_rules,
                ..
            } => {
                assert!(strict);
                assert_eq!(
                    disable_rules,
                    vec!["graph/parent-cycle", "wiring/switch-overlap"]
                );
            }
            _ => panic!("expected Lint command"),
        }
    }

    #[test]
    fn test_cli_parses_lint_only_rules_and_format() {
        let cli = Cli::try_parse_from([
            "rigforge",
            "lint",
            "--input",
            "rig.rig.json",
            "--only-rules",
            "graph/layer-range,module/property-bounds",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Lint {
                only_rules, format, ..
            } => {
                assert_eq!(
                    only_rules.as_deref(),
                    Some("graph/layer-range,module/property-bounds")
                );
                assert_eq!(format, "json");
            }
            _ => panic!("expected Lint command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_lint_format() {
        let result = Cli::try_parse_from([
            "rigforge", "lint", "--input", "rig.rig.json", "--format", "yaml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_rules_listing() {
        let cli = Cli::try_parse_from(["rigforge", "rules", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Rules { format } => assert_eq!(format, "json"),
            _ => panic!("expected Rules command"),
        }
    }

    #[test]
    fn test_cli_parses_batch_validate() {
        let cli = Cli::try_parse_from(["rigforge", "batch-validate", "--dir", "requests"]).unwrap();
        match cli.command {
            Commands::BatchValidate { dir, out_dir } => {
                assert_eq!(dir, "requests");
                assert_eq!(out_dir, None);
            }
            _ => panic!("expected BatchValidate command"),
        }
    }

    #[test]
    fn test_cli_parses_batch_validate_out_dir() {
        let cli = Cli::try_parse_from([
            "rigforge",
            "batch-validate",
            "--dir",
            "requests",
            "--out-dir",
            "reports",
        ])
        .unwrap();
        match cli.command {
            Commands::BatchValidate { out_dir, .. } => {
                assert_eq!(out_dir.as_deref(), Some("reports"));
            }
            _ => panic!("expected BatchValidate command"),
        }
    }
}
