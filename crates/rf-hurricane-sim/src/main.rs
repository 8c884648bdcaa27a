//! Hurricane autoplay runner
//!
//! Drives a headless `GameSession` with a simulated frame clock and prints a
//! JSON summary of what the engine paid.
//!
//! Usage:
//!   rf-hurricane-sim --rounds 1000 --seed 7
//!   rf-hurricane-sim --config game.yaml --timing turbo
//!   rf-hurricane-sim --regular --bet 5

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use rf_hurricane::{GameConfig, GameSession, NullRenderer, SessionStats, TimingConfig, TimingProfile};

#[derive(Parser)]
#[command(name = "rf-hurricane-sim", about = "Headless hurricane slot autoplay")]
struct Cli {
    /// Rounds to play
    #[arg(short, long, default_value_t = 100)]
    rounds: u64,

    /// RNG seed (OS entropy when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Bet per round (config default when omitted)
    #[arg(short, long)]
    bet: Option<f64>,

    /// Game config file (.json, .yaml or .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the timing profile
    #[arg(short, long, value_enum)]
    timing: Option<TimingArg>,

    /// Simulated frame length in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,

    /// Frame budget per round before the run is aborted
    #[arg(long, default_value_t = 1_000_000)]
    max_frames: u64,

    /// Play regular payline spins instead of hurricane rounds
    #[arg(long)]
    regular: bool,

    /// Pretty-print the summary
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimingArg {
    Normal,
    Turbo,
    Studio,
}

impl From<TimingArg> for TimingProfile {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Normal => TimingProfile::Normal,
            TimingArg::Turbo => TimingProfile::Turbo,
            TimingArg::Studio => TimingProfile::Studio,
        }
    }
}

/// Printed at the end of a run
#[derive(Serialize)]
struct Summary {
    rounds: u64,
    seed: Option<u64>,
    bet: f64,
    frames: u64,
    simulated_ms: f64,
    rtp: f64,
    hit_rate: f64,
    /// How many hurricanes ended on each category (index 0 = category 1)
    final_categories: [u64; 5],
    stats: SessionStats,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.frame_ms.is_finite() || cli.frame_ms <= 0.0 {
        bail!("--frame-ms must be a positive number, got {}", cli.frame_ms);
    }

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None if cli.regular => GameConfig::regular(),
        None => GameConfig::hurricane(),
    };
    if cli.regular {
        config.hurricane_enabled = false;
    }
    if let Some(timing) = cli.timing {
        config.timing = TimingConfig::from_profile(timing.into());
    }
    let bet = cli.bet.unwrap_or(config.default_bet);

    let mut session = match cli.seed {
        Some(seed) => GameSession::with_seed(config, NullRenderer, seed),
        None => GameSession::new(config, NullRenderer),
    }
    .context("Failed to create session")?;

    log::info!("[Sim] Playing {} rounds at bet {:.2}", cli.rounds, bet);

    let mut frames = 0u64;
    let mut final_categories = [0u64; 5];
    for round in 0..cli.rounds {
        session
            .trigger_spin(bet)
            .with_context(|| format!("Round {} rejected", round + 1))?;

        let mut round_frames = 0u64;
        while session.is_spinning() {
            if round_frames >= cli.max_frames {
                bail!(
                    "Round {} did not finish within {} frames",
                    round + 1,
                    cli.max_frames
                );
            }
            session.tick(cli.frame_ms);
            round_frames += 1;
        }
        frames += round_frames;

        if let Some(outcome) = session
            .last_round_result()
            .and_then(|r| r.hurricane.as_ref())
        {
            let slot = usize::from(outcome.final_category.saturating_sub(1));
            if let Some(count) = final_categories.get_mut(slot) {
                *count += 1;
            }
        }
        if (round + 1) % 1000 == 0 {
            log::info!(
                "[Sim] {} rounds, RTP {:.2}%",
                round + 1,
                session.stats().rtp()
            );
        }
    }

    let stats = session.stats().clone();
    let summary = Summary {
        rounds: cli.rounds,
        seed: cli.seed,
        bet,
        frames,
        simulated_ms: frames as f64 * cli.frame_ms,
        rtp: stats.rtp(),
        hit_rate: stats.hit_rate(),
        final_categories,
        stats,
    };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", json);
    Ok(())
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if yaml {
        GameConfig::from_yaml(&text)
    } else {
        GameConfig::from_json(&text)
    };
    config.with_context(|| format!("Invalid config {}", path.display()))
}
