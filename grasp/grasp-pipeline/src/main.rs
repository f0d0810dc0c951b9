//! `grasp-refine`: refine and validate a batch of generated grasps.
//!
//! # Commands
//!
//! - `grasp-refine run --config run.json --input batch.json --output out/`
//! - `grasp-refine categories`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use grasp_pipeline::{BatchRunner, CommandSimulator, GenerationBatch, OutputWriter, RunConfig};
use grasp_refine::LinearHandModel;
use grasp_types::ToolCategory;
use grasp_validate::{DisabledSimulator, Simulator};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grasp-refine")]
#[command(about = "Refine generated hand grasps and keep the physically plausible ones", long_about = None)]
#[command(version)]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Refine and validate one generation batch
    Run(RunArgs),
    /// Print the tool category table
    Categories,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Run configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Generation batch (JSON); hand meshes are read from test_meshes/ next to it
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Override the tool category
    #[arg(long)]
    category: Option<ToolCategory>,

    /// Override the optimizer iteration budget
    #[arg(long)]
    iterations: Option<usize>,

    /// Override the simulator program
    #[arg(long)]
    simulator: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Categories => {
            categories();
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = RunConfig::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(category) = args.category {
        config = config.with_category(category);
    }
    if let Some(iterations) = args.iterations {
        config = config.with_iterations(iterations);
    }
    if let Some(program) = args.simulator {
        config = config.with_simulator(program);
    }
    config.validate().context("invalid configuration")?;

    let model = LinearHandModel::load(&config.hand_model_path)
        .with_context(|| format!("failed to load hand model {}", config.hand_model_path.display()))?;

    let command;
    let simulator: &dyn Simulator = match &config.simulator.program {
        Some(program) => {
            command = CommandSimulator::new(program.clone(), config.simulator.args.clone());
            &command
        }
        None => &DisabledSimulator,
    };

    let runner = BatchRunner::new(&config, &model, simulator)
        .with_context(|| format!("failed to prepare object {}", config.object_path.display()))?;

    let batch = GenerationBatch::load(&args.input)
        .with_context(|| format!("failed to load batch {}", args.input.display()))?;
    let batch_dir = args.input.parent().map(PathBuf::from).unwrap_or_default();
    let output = OutputWriter::create(&args.output)
        .with_context(|| format!("failed to create output directory {}", args.output.display()))?;

    let report = runner.run(&batch, &batch_dir, &output).context("batch run failed")?;
    println!("{report}");
    Ok(())
}

fn categories() {
    println!(
        "{:<18} {:>8} {:>12} {:>12} {:>9} {:>10}",
        "category", "contact", "consistency", "penetration", "keypoint", "threshold"
    );
    for category in ToolCategory::ALL {
        let profile = category.profile();
        let w = profile.weights;
        println!(
            "{:<18} {:>8} {:>12} {:>12} {:>9} {:>10}",
            category.name(),
            w.contact,
            w.consistency,
            w.penetration,
            w.keypoint,
            profile.penetration_threshold
        );
    }
}
