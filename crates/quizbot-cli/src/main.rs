//! Quizbot CLI
//!
//! Runs a quiz session in the terminal, with a console actor standing in
//! for the robot.

mod console;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use console::ConsoleActor;
use quizbot_engine::{
    EventBroadcaster, QuizConfig, SessionEvent, SessionOrchestrator, SessionReport, Timing,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::BufReader;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Default number of seconds to wait for a typed answer.
const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 30;

/// How long shutdown waits for the stdin reader, which cannot be cancelled.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Quizbot - interactive quiz sessions
///
/// Plays the quiz in the terminal: the robot's lines are printed and answers
/// are typed on stdin.
#[derive(Parser, Debug)]
#[command(name = "quizbot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: quizbot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Number of questions per round
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Seed for the question draw, for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Skip playing every item before the first round
    #[arg(long)]
    no_showcase: bool,

    /// Do not wait between intents
    #[arg(long)]
    no_pauses: bool,

    /// Seconds to wait for an answer before treating it as not heard
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_ANSWER_TIMEOUT_SECS)]
    answer_timeout: u64,

    /// Write the session report as JSON to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    tracing::info!("Quizbot starting");
    tracing::debug!(config = ?args.config, "Config file");

    let code = match runtime.block_on(run_quiz(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    };

    // A pending stdin read would otherwise hold the runtime open until Enter.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}

/// Runs one quiz session against the console.
async fn run_quiz(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if args.no_showcase {
        config.showcase = false;
    }
    if args.no_pauses {
        config.timing = Timing::none();
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let events = EventBroadcaster::default();
    let logger = spawn_event_logger(events.subscribe());

    let mut session = SessionOrchestrator::new(config)?.with_events(events);
    if let Some(seed) = args.seed {
        tracing::debug!(seed, "Using seeded question draw");
        session = session.with_rng(StdRng::seed_from_u64(seed));
    }

    let mut actor = ConsoleActor::new(
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        Duration::from_secs(args.answer_timeout),
    );
    if args.no_pauses {
        actor = actor.without_pauses();
    }

    println!();
    println!("Type your answers (or #N to show answer card N) and press Enter. Press Ctrl+C to stop.");
    println!();

    let outcome = tokio::select! {
        result = session.run(&mut actor) => Some(result),
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, stopping session");
            None
        }
    };

    let report = session.report();
    // Dropping the session closes the event channel and stops the logger.
    drop(session);
    if let Err(e) = logger.await {
        tracing::warn!(error = %e, "Event logger stopped abnormally");
    }

    println!();
    if outcome.is_none() {
        println!("Session interrupted");
    }
    print_summary(&report);

    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    match outcome {
        Some(Err(e)) => Err(e.into()),
        Some(Ok(_)) | None => Ok(()),
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<QuizConfig> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            QuizConfig::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => QuizConfig::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Logs every session event until the channel closes.
fn spawn_event_logger(mut receiver: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::debug!(event = %json, "Session event"),
                    Err(e) => tracing::warn!(error = %e, "Failed to serialize session event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Prints the loaded configuration.
fn print_config(config: &QuizConfig) {
    let labels: Vec<&str> = config.items.iter().map(|item| item.label.as_str()).collect();
    println!("Configuration loaded:");
    println!("  Items: {}", labels.join(", "));
    println!("  Questions per round: {}", config.rounds);
    println!("  Score policy: {:?}", config.score_policy);
    println!("  Success bar: {:.0}%", config.success_bar * 100.0);
    println!("  Showcase: {}", if config.showcase { "on" } else { "off" });
    if let Some(max) = config.max_replays {
        println!("  Max replays: {max}");
    }
}

/// Prints a summary of the session.
fn print_summary(report: &SessionReport) {
    println!("=== Quizbot Summary ===");
    println!("State: {}", report.state);
    if let Some(reason) = report.end_reason {
        println!("Ended: {reason}");
    }
    println!("Rounds played: {}", report.rounds.len());
    for record in &report.rounds {
        println!(
            "  Round {}: {}/{} correct",
            record.round, record.summary.correct_this_round, record.summary.total_this_round
        );
    }
    println!("Score: {}/{}", report.score.correct, report.score.total);

    if let Some(ended_at) = report.ended_at {
        let elapsed = ended_at - report.started_at;
        println!(
            "Duration: {}m {}s",
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60
        );
    }
}

/// Writes the session report as pretty-printed JSON.
fn write_report(report: &SessionReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    println!("Report written to {}", path.display());
    Ok(())
}
