use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pixelbloom_app::{
    DEFAULT_BACKGROUND, HeadlessOptions, export_png, import_png, load_config, run_headless,
};
use pixelbloom_core::{Engine, EngineConfig, Rgb, Rule, Session};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "pixelbloom",
    version,
    about = "Evolve pixel-art grids with generative rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the step loops headless on a simulated clock.
    Run(RunArgs),
    /// List the available rules and their families.
    Rules,
    /// Print the default engine configuration as JSON.
    DefaultConfig,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// JSON engine configuration; missing fields use defaults.
    #[arg(short, long, env = "PIXELBLOOM_CONFIG")]
    config: Option<PathBuf>,
    /// Override grid height.
    #[arg(long)]
    rows: Option<usize>,
    /// Override grid width.
    #[arg(long)]
    cols: Option<usize>,
    /// Override the RNG seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Override the starting rule (e.g. random, conway, vein).
    #[arg(long)]
    rule: Option<Rule>,
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Stop after this many spread steps.
    #[arg(long)]
    steps: Option<u64>,
    /// Seed the canvas from an image instead of the initial shape injection.
    #[arg(long)]
    import: Option<PathBuf>,
    /// Write a PNG of the final canvas.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Write a JSON run report.
    #[arg(long, env = "PIXELBLOOM_REPORT")]
    report: Option<PathBuf>,
    /// Pixels per cell in the snapshot.
    #[arg(long, default_value_t = 2)]
    cell_size: u32,
    /// Snapshot color for empty cells, as #rrggbb.
    #[arg(long, default_value_t = DEFAULT_BACKGROUND)]
    background: Rgb,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Rules => {
            for rule in Rule::ALL {
                println!("{:<12} {:?}", rule.name(), rule.family());
            }
            Ok(())
        }
        Command::DefaultConfig => {
            let json = serde_json::to_string_pretty(&EngineConfig::default())
                .context("failed to serialize default config")?;
            println!("{json}");
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.cols = cols;
    }
    if let Some(seed) = args.seed {
        config.rng_seed = Some(seed);
    }
    if let Some(rule) = args.rule {
        config.rule = rule;
    }

    let mut engine = Engine::new(config).context("invalid engine configuration")?;
    match &args.import {
        Some(path) => import_png(path, &mut engine)?,
        None => engine.inject_shapes(),
    }
    info!(
        rows = engine.grid().rows(),
        cols = engine.grid().cols(),
        rule = %engine.rule(),
        "starting headless run"
    );

    let duration = Duration::try_from_secs_f64(args.seconds.max(0.0))
        .context("run duration out of range")?;
    let options = HeadlessOptions {
        duration,
        max_spread_steps: args.steps,
        ..HeadlessOptions::default()
    };
    let mut session = Session::new(engine);
    let report = run_headless(&mut session, &options);

    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("failed to write run report to {}", path.display()))?;
    }
    if let Some(path) = &args.snapshot {
        export_png(
            session.engine().canvas(),
            args.background,
            args.cell_size,
            path,
        )?;
    }
    println!(
        "{} spread steps, {} occupied cells, {} dot / {} shape injections",
        report.summary.spread_steps,
        report.summary.final_occupied,
        report.summary.dot_injections,
        report.summary.shape_injections
    );
    Ok(())
}
