//! WireNet CLI - normalize schematic wire geometry and inspect nets from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;
use wirenet::{
    build_nets, load_model, pick_probe_target, resolve_probe_targets, save_model, CheckReport,
    EngineOptions, GroundStatus, Model, Net, Point, ProbeStrategy, Severity,
    TransformError, WireNetCore,
};

#[derive(Parser)]
#[command(name = "wirenet")]
#[command(about = "Orthogonal wire routing and net extraction for schematic models", long_about = None)]
#[command(version)]
struct Cli {
    /// Grid pitch in world units (overrides the config file)
    #[arg(long, global = true)]
    grid: Option<f64>,

    /// JSON file with engine options
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log normalization details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair and normalize every wire in a model
    Normalize {
        /// Path to the model JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Also minimize bends and length between anchors
        #[arg(long)]
        optimize: bool,
    },

    /// List the electrical nets of a model
    Nets {
        /// Path to the model JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Report geometry invariants and ground status
    Check {
        /// Path to the model JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code unless ground reaches a device pin
        #[arg(long)]
        fail_on_floating_ground: bool,
    },

    /// Resolve what a pointer at (x, y) would probe
    Probe {
        /// Path to the model JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// How to choose between a node and a component hit
        #[arg(long, value_enum, default_value = "closest")]
        strategy: StrategyArg,
    },

    /// Simplify the model if its nets stay the same
    Simplify {
        /// Path to the model JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Snap the model to a new grid if its nets stay the same
    Regrid {
        /// Path to the model JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target grid pitch
        #[arg(long = "to", value_name = "GRID")]
        to: f64,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[derive(Clone, ValueEnum)]
enum StrategyArg {
    Closest,
    NodeFirst,
}

impl From<StrategyArg> for ProbeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Closest => ProbeStrategy::Closest,
            StrategyArg::NodeFirst => ProbeStrategy::NodeFirst,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let mut options = match &cli.config {
        Some(path) => EngineOptions::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineOptions::default(),
    };
    if let Some(grid) = cli.grid {
        options = options.with_grid(grid);
    }

    match cli.command {
        Commands::Normalize {
            file,
            output,
            optimize,
        } => {
            options.optimize_paths |= optimize;
            handle_normalize(&file, output.as_deref(), &options)
        }
        Commands::Nets { file, format } => handle_nets(&file, format),
        Commands::Check {
            file,
            format,
            fail_on_floating_ground,
        } => handle_check(&file, format, fail_on_floating_ground, &options),
        Commands::Probe {
            file,
            x,
            y,
            strategy,
        } => handle_probe(&file, Point::new(x, y), strategy.into(), &options),
        Commands::Simplify { file, output } => {
            let model = read_model(&file)?;
            let result = WireNetCore::simplify_model(&model, &options);
            finish_transform(result, output.as_deref())
        }
        Commands::Regrid { file, to, output } => {
            let model = read_model(&file)?;
            let result = WireNetCore::regrid_model(&model, to, &options);
            finish_transform(result, output.as_deref())
        }
    }
}

fn read_model(file: &Path) -> Result<Model> {
    load_model(file).with_context(|| format!("failed to read model {}", file.display()))
}

fn write_model(model: &Model, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => save_model(path, model)
            .with_context(|| format!("failed to write model {}", path.display())),
        None => {
            println!("{}", model.to_json_string()?);
            Ok(())
        }
    }
}

fn handle_normalize(file: &Path, output: Option<&Path>, options: &EngineOptions) -> Result<i32> {
    let mut model = read_model(file)?;
    let report = WireNetCore::normalize(&mut model, options);
    if !report.converged {
        tracing::warn!(rounds = report.rounds, "normalization did not reach a fixed point");
    }
    write_model(&model, output)?;
    if output.is_some() {
        eprintln!(
            "Normalized {} wire(s) into {} in {} round(s)",
            report.wires_before, report.wires_after, report.rounds
        );
    }
    Ok(0)
}

fn handle_nets(file: &Path, format: OutputFormat) -> Result<i32> {
    let model = read_model(file)?;
    let nets = build_nets(&model);
    match format {
        OutputFormat::Human => output_nets_human(&nets),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nets)?),
    }
    Ok(0)
}

fn output_nets_human(nets: &[Net]) {
    println!("{} net(s)", nets.len());
    println!("{}", "─".repeat(60));
    for net in nets {
        let mut line = format!("  {}", net.node_label());
        if !net.labels.is_empty() {
            line.push_str(&format!(" [{}]", net.labels.join(", ")));
        }
        if net.grounded {
            line.push_str(" (ground)");
        }
        println!("{}", line);
        for pin in &net.pins {
            println!("    - {}", pin.identity());
        }
    }
}

fn handle_check(
    file: &Path,
    format: OutputFormat,
    fail_on_floating_ground: bool,
    options: &EngineOptions,
) -> Result<i32> {
    let model = read_model(file)?;
    let report = WireNetCore::check(&model, options);

    match format {
        OutputFormat::Human => output_check_human(file, &report),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "issues": report.issues,
                "stats": report.stats,
                "ground": report.ground,
                "netCount": report.net_count,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if report.has_errors() {
        return Ok(1);
    }
    if fail_on_floating_ground && report.ground != GroundStatus::Present {
        return Ok(1);
    }
    Ok(0)
}

fn output_check_human(file: &Path, report: &CheckReport) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    if report.total_issues() == 0 {
        println!("  No issues found");
    }

    for (title, severity) in [
        ("ERRORS", Severity::Error),
        ("WARNINGS", Severity::Warning),
        ("INFO", Severity::Info),
    ] {
        let issues: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect();
        if issues.is_empty() {
            continue;
        }
        println!("\n  {}:", title);
        for issue in issues {
            println!("    - [{}] {}", issue.rule_id, issue.message);
            if let Some(ref wire) = issue.wire {
                println!("      Wire: {}", wire);
            }
        }
    }

    let ground = match report.ground {
        GroundStatus::Present => "present",
        GroundStatus::Floating => "floating",
        GroundStatus::Missing => "missing",
    };
    println!("\n  Summary:");
    println!("    Nets:     {}", report.net_count);
    println!("    Ground:   {}", ground);
    println!("    Errors:   {}", report.stats.errors);
    println!("    Warnings: {}", report.stats.warnings);
    println!("    Info:     {}", report.stats.info);
}

fn handle_probe(
    file: &Path,
    world: Point,
    strategy: ProbeStrategy,
    options: &EngineOptions,
) -> Result<i32> {
    let model = read_model(file)?;
    let targets = resolve_probe_targets(&model, &world, options);
    let picked = pick_probe_target(&targets, strategy);

    let output = serde_json::json!({
        "targets": targets,
        "picked": picked,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(if picked.is_some() { 0 } else { 1 })
}

fn finish_transform(result: Result<Model, TransformError>, output: Option<&Path>) -> Result<i32> {
    match result {
        Ok(model) => {
            write_model(&model, output)?;
            Ok(0)
        }
        Err(e) => {
            tracing::debug!(error = %e, "transform rejected");
            println!("{}", serde_json::to_string(&e)?);
            Ok(1)
        }
    }
}
