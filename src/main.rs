use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use autoquest::config::AutoquestConfig;
use autoquest::error::Result;
use autoquest::interaction::Point;
use autoquest::orchestrator::Orchestrator;
use autoquest::sim::{PatrolMission, SimWorld};
use autoquest::stop_rule::StopRule;
use autoquest::task::{Task, TaskStatus};

#[derive(Parser)]
#[command(name = "autoquest", about = "Task/mission orchestration runner")]
struct Cli {
    /// Directory holding autoquest.toml.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a registered task to its terminal status.
    Run { task: String },
    /// List registered tasks.
    List,
    /// Write a default autoquest.toml or print the effective configuration.
    Config {
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("autoquest=debug")
    } else {
        EnvFilter::new("autoquest=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AutoquestConfig::load(&cli.config_dir).await?;

    match cli.command {
        Commands::Run { task } => {
            let orchestrator = build_orchestrator(config);
            let status = orchestrator.run(&task).await?;
            println!("{task}: {status}");
            Ok(if status == TaskStatus::Completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::List => {
            let orchestrator = build_orchestrator(config);
            for name in orchestrator.task_names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init } => {
            if init {
                config.save(&cli.config_dir).await?;
                println!("wrote {}", cli.config_dir.join("autoquest.toml").display());
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// The built-in registry. Domain crates embed the library and register
/// their own tasks; the binary ships the simulated patrol task so the
/// scheduler can be exercised end to end without a live environment.
fn build_orchestrator(config: AutoquestConfig) -> Orchestrator {
    let world = SimWorld::shared();
    let mut orchestrator = Orchestrator::new(config, world.interactor());

    orchestrator.register("patrol", |interactor, config| {
        let mut task = Task::new("patrol", interactor, config);
        task.add_subordinate(
            Box::new(PatrolMission::new(
                "patrol_to_origin",
                Point::new(10.0, 10.0),
                (-1.0, -1.0),
                StopRule::arrival(Point::new(0.0, 0.0), 1.0),
            )),
            false,
        );
        task
    });

    orchestrator
}
