use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use aimcheck::{
    evaluate_validated, resolve_check, validate_all_checks, validate_group_depth, AimCheck,
    AimcheckError, CompiledRules, Expression, ExpressionNode, Placement, RuleLimits, Scenario,
    MAX_RULE_GROUP_DEPTH,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Evaluate placement scenarios against their aim rules.
#[derive(Parser)]
#[command(name = "aimcheck", version, about = "Evaluate placement scenarios against their aim rules")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// More log output on stderr (-v debug, -vv trace). Defaults to RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every aim of a scenario against a set of placements
    Evaluate {
        /// Path to the scenario JSON file
        scenario: PathBuf,
        /// JSON array of {"deviceId", "anchorId"} objects; none if omitted
        #[arg(long)]
        placements: Option<PathBuf>,
        /// Treat the scenario as connected ("Connect All" pressed)
        #[arg(long)]
        connected: bool,
        /// Evaluate even if groups are nested too deeply (they fail closed)
        #[arg(long)]
        skip_validation: bool,
        /// Deepest allowed group nesting
        #[arg(long, default_value_t = MAX_RULE_GROUP_DEPTH)]
        max_depth: usize,
    },

    /// Check rule structure without evaluating
    Validate {
        /// Path to the scenario JSON file
        scenario: PathBuf,
        /// Deepest allowed group nesting
        #[arg(long, default_value_t = MAX_RULE_GROUP_DEPTH)]
        max_depth: usize,
    },

    /// Print every check's rule in text syntax
    Explain {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },

    /// Evaluate a single expression written in text syntax
    Expr {
        /// Expression, e.g. "lamp@desk AND (fan@ceiling OR fan@wall)"
        expression: String,
        /// JSON array of {"deviceId", "anchorId"} objects; none if omitted
        #[arg(long)]
        placements: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            2
        }
    };
    process::exit(code);
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("aimcheck=debug"),
        _ => EnvFilter::new("aimcheck=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<i32, AimcheckError> {
    match &cli.command {
        Commands::Evaluate {
            scenario,
            placements,
            connected,
            skip_validation,
            max_depth,
        } => {
            let scenario = Scenario::from_file(scenario)?;
            let placements = read_placements(placements.as_deref())?;
            let limits = RuleLimits::new().max_group_depth(*max_depth);

            let outcome = if *skip_validation {
                CompiledRules::compile(&scenario.rules, limits).evaluate(&placements, *connected)
            } else {
                match evaluate_validated(&scenario, &placements, *connected, limits) {
                    Ok(outcome) => outcome,
                    Err(refused) => {
                        match cli.output {
                            OutputFormat::Text => eprintln!("{refused}"),
                            OutputFormat::Json => print_json(&refused.report)?,
                        }
                        return Ok(1);
                    }
                }
            };

            match cli.output {
                OutputFormat::Text => println!("{outcome}"),
                OutputFormat::Json => print_json(&outcome)?,
            }
            Ok(if outcome.passed_all() { 0 } else { 1 })
        }

        Commands::Validate {
            scenario,
            max_depth,
        } => {
            let scenario = Scenario::from_file(scenario)?;
            let report = validate_all_checks(&scenario.rules.checks, *max_depth);
            match cli.output {
                OutputFormat::Text => println!("{report}"),
                OutputFormat::Json => print_json(&report)?,
            }
            Ok(if report.ok { 0 } else { 1 })
        }

        Commands::Explain { scenario } => {
            let scenario = Scenario::from_file(scenario)?;
            match cli.output {
                OutputFormat::Text => {
                    if let Some(title) = &scenario.title {
                        println!("# {title}");
                    }
                    for check in &scenario.rules.checks {
                        println!("{}", explain_check(check));
                    }
                }
                OutputFormat::Json => print_json(&scenario.rules)?,
            }
            Ok(0)
        }

        Commands::Expr {
            expression,
            placements,
        } => {
            let node = ExpressionNode::from_text(expression)?;
            let depth = validate_group_depth(Some(&node), MAX_RULE_GROUP_DEPTH);
            if !depth.ok {
                eprintln!(
                    "warning: groups nested too deeply at {}; they evaluate to false",
                    depth.paths()
                );
            }
            let placements = read_placements(placements.as_deref())?;
            let passed = resolve_check(&AimCheck::new("expr").tree(node), &placements);
            match cli.output {
                OutputFormat::Text => println!("{}", if passed { "PASS" } else { "FAIL" }),
                OutputFormat::Json => print_json(&passed)?,
            }
            Ok(if passed { 0 } else { 1 })
        }
    }
}

fn read_placements(path: Option<&Path>) -> Result<Vec<Placement>, AimcheckError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let input = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&input)?)
}

fn explain_check(check: &AimCheck) -> String {
    let rule = match &check.expression {
        Some(Expression::Tree(node)) => node.to_string(),
        Some(legacy @ Expression::Legacy(clauses)) if !clauses.is_empty() => {
            format!("{legacy} (legacy)")
        }
        _ if check.required_placements.is_empty() => "always".to_owned(),
        _ => {
            let pairs: Vec<String> = check
                .required_placements
                .iter()
                .map(ToString::to_string)
                .collect();
            format!("({}) (required placements)", pairs.join(" AND "))
        }
    };
    let connect = if check.connected_required {
        " [connect required]"
    } else {
        ""
    };
    format!("{}: {rule}{connect}", check.aim_id)
}

fn print_json(value: &impl Serialize) -> Result<(), AimcheckError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
