//! Exit Experiment CLI.
//!
//! Run staggered-exit coordination campaigns over a campus timetable.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_experiment::judge::ProbabilityJudge;
use exit_experiment::oracle::{ChatOracle, DialogueOracle, SilentOracle};
use exit_experiment::session::SessionConfig;
use exit_experiment::{CampaignDriver, Timetable};

#[derive(Parser)]
#[command(name = "exit-experiment")]
#[command(about = "Negotiated staggered-exit coordination campaigns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ollama/vLLM host URL for narration
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost:11434")]
    host: String,

    /// Narration model
    #[arg(long, default_value = "qwen2.5:1.5b")]
    model: String,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full campaign.
    Run {
        /// Timetable TOML (built-in campus when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Random seed for the decision judge
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Narrate turns with the LLM (silent otherwise)
        #[arg(long)]
        narrate: bool,
        /// Negotiation turns per session
        #[arg(long, default_value = "12")]
        max_turns: u32,
        /// Extra oracle attempts per turn
        #[arg(long, default_value = "0")]
        oracle_retries: u32,
        /// Output file for the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the resolved timetable configuration.
    Timetable {
        /// Timetable TOML (built-in campus when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_timetable(config: Option<&PathBuf>) -> Result<Timetable> {
    match config {
        Some(path) => Timetable::load(path),
        None => Ok(Timetable::campus_default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            config,
            seed,
            narrate,
            max_turns,
            oracle_retries,
            output,
        } => {
            let timetable = load_timetable(config.as_ref())?;
            let session_config = SessionConfig {
                max_turns,
                oracle_retries,
                ..Default::default()
            };

            let oracle: Box<dyn DialogueOracle> = if narrate {
                Box::new(ChatOracle::new(&cli.host, &cli.model))
            } else {
                Box::new(SilentOracle)
            };
            let mut judge = ProbabilityJudge::new(seed);

            let driver = CampaignDriver::new(timetable, session_config, seed);
            let report = driver.run(&mut judge, oracle.as_ref()).await;

            println!("{}", report.render_console());

            if let Some(output) = output {
                if let Some(parent) = output.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                report.write_json(&output)?;
                println!("Report written to: {}", output.display());
            }
        }

        Commands::Timetable { config } => {
            let timetable = load_timetable(config.as_ref())?;
            println!(
                "capacity: {}/min  weeks: {}",
                timetable.bottleneck_capacity, timetable.weeks
            );
            println!("classrooms:");
            for room in &timetable.classrooms {
                println!("  {}: {} students", room.name, room.attendance);
            }
            for day in &timetable.days {
                println!("{}:", day.name);
                for slot in &day.slots {
                    println!("  {}: {}", slot.label, slot.classrooms.join(", "));
                }
            }
        }
    }

    Ok(())
}
