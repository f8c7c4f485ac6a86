mod app;
mod config;

use std::path::{Path, PathBuf};
use std::process::{self, ExitCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use gazelat_core::{RunStatus, SignalFlags};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

const DEFAULT_CONFIG: &str = "gazelat.toml";

/// Gaze-contingent display latency rig
#[derive(Parser, Debug)]
#[command(name = "gazelat", version, about)]
struct Args {
    /// Path to TOML configuration file [default: gazelat.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of trials to run, overriding the configuration
    #[arg(short, long)]
    trials: Option<u32>,
}

fn main() -> ExitCode {
    // RUST_LOG=debug shows state transitions and flicker cadence
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let signals = SignalFlags::new();
    install_interrupt_handler(signals.clone());
    let result = load_config(&args).and_then(|config| app::run(&config, signals));

    match result {
        Ok(report) => match report.status {
            RunStatus::Completed => ExitCode::SUCCESS,
            RunStatus::Aborted => ExitCode::from(2),
        },
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => AppConfig::from_file(DEFAULT_CONFIG)?,
        None => {
            info!("no {DEFAULT_CONFIG} found, using defaults");
            AppConfig::default()
        }
    };
    if let Some(trials) = args.trials {
        config.experiment.trial_count = trials;
    }
    Ok(config)
}

/// First Ctrl-C aborts the run at the next trial boundary or armed frame; a
/// second one quits at once, for a run stuck in an unbounded wait.
fn install_interrupt_handler(signals: SignalFlags) {
    let pressed = Arc::new(AtomicBool::new(false));
    let result = ctrlc::set_handler(move || {
        if pressed.swap(true, Ordering::SeqCst) {
            process::exit(2);
        }
        warn!("interrupt received, aborting after the current step (Ctrl-C again to quit now)");
        signals.raise_abort();
    });
    if let Err(e) = result {
        warn!(error = %e, "Ctrl-C handler not installed");
    }
}
