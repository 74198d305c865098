//! camproll - camp roster allocation from the command line.
//!
//! ## Commands
//!
//! - `run`: every stage in order
//! - `groups`: allocate discussion groups
//! - `rooms`: allocate single-sex rooms (asks for room counts unless given)
//! - `merge`: write the master roster with group and room names
//! - `cards`: print ID card sheets per group

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use camproll_core::{
    CampError, Config, FixedRoomCounts, InteractivePrompt, Pipeline, RoomCountProvider, RoomCounts,
    Stage, StageResult, StageSummary,
};

#[derive(Parser)]
#[command(name = "camproll")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Camp roster allocation: groups, rooms, master roster and ID cards", long_about = None)]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, global = true, env = "CAMPROLL_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for reproducible allocations (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy, Default)]
struct RoomArgs {
    /// Number of male rooms (skips the prompt when given with --female-rooms)
    #[arg(long, requires = "female_rooms")]
    male_rooms: Option<usize>,

    /// Number of female rooms
    #[arg(long, requires = "male_rooms")]
    female_rooms: Option<usize>,
}

impl RoomArgs {
    fn provider(self) -> Box<dyn RoomCountProvider> {
        match (self.male_rooms, self.female_rooms) {
            (Some(male), Some(female)) => Box::new(FixedRoomCounts(RoomCounts::new(male, female))),
            _ => Box::new(InteractivePrompt::stdio()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage in order
    Run {
        #[command(flatten)]
        rooms: RoomArgs,
    },

    /// Allocate attendees into discussion groups
    Groups,

    /// Allocate attendees into single-sex rooms
    Rooms {
        #[command(flatten)]
        rooms: RoomArgs,
    },

    /// Write the master roster with group and room names
    Merge,

    /// Print ID card sheets, one PDF per group
    Cards,
}

impl Commands {
    /// The single stage to run, or `None` for the whole pipeline.
    fn stage(&self) -> Option<Stage> {
        match self {
            Commands::Run { .. } => None,
            Commands::Groups => Some(Stage::Groups),
            Commands::Rooms { .. } => Some(Stage::Rooms),
            Commands::Merge => Some(Stage::Merge),
            Commands::Cards => Some(Stage::Cards),
        }
    }

    fn room_args(&self) -> RoomArgs {
        match self {
            Commands::Run { rooms } | Commands::Rooms { rooms } => *rooms,
            _ => RoomArgs::default(),
        }
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so the room prompt
/// on stdout stays readable. The returned guard must live until exit for
/// file logs to be flushed.
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn print_result(result: &StageResult) {
    let detail = match &result.summary {
        StageSummary::Groups { groups, attendees } => {
            format!("{} attendees into {} groups", attendees, groups)
        }
        StageSummary::Rooms { rooms, attendees } => {
            format!("{} attendees into {} rooms", attendees, rooms)
        }
        StageSummary::Merge { rows, grouped, roomed } => {
            format!("{} rows ({} grouped, {} roomed)", rows, grouped, roomed)
        }
        StageSummary::Cards { files, cards, pages } => {
            format!("{} cards on {} pages in {} files", cards, pages, files)
        }
    };
    println!("{:<7} {} [{} ms]", result.stage.name(), detail, result.duration_ms);
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;

    let mut rng = config.rng();
    let mut provider = cli.command.room_args().provider();
    let mut pipeline = Pipeline::new(&config, provider.as_mut());

    match cli.command.stage() {
        Some(stage) => print_result(&pipeline.run_stage(stage, &mut rng)?),
        None => {
            let report = pipeline.run(&mut rng)?;
            for result in &report.stages {
                print_result(result);
            }
            println!(
                "Completed {} stages in {} ms (started {})",
                report.stages.len(),
                report.total_duration_ms(),
                report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

/// One-line error report. A stage failure names the stage once, followed by
/// its underlying cause.
fn failure_message(e: &anyhow::Error) -> String {
    let stage_failure = e.chain().find_map(|cause| match cause.downcast_ref::<CampError>() {
        Some(CampError::Stage { stage, source }) => Some((*stage, source)),
        _ => None,
    });
    match stage_failure {
        Some((stage, source)) => format!("Error in stage '{}': {}", stage, source),
        None => format!("Error: {:#}", e),
    }
}

fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _guard = match init_tracing(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("camproll starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}
