use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use earth_wisdom::core::{JsonFileStore, SystemClock};
use earth_wisdom::wisdom::gemini::GeminiClient;
use earth_wisdom::{Config, EnvironmentalSnapshot, WisdomEngine};

#[derive(Parser)]
#[command(name = "earth-wisdom")]
#[command(about = "Daily environmental wisdom tips powered by Gemini")]
struct Cli {
    /// Directory holding config.json and the tip cache
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(flatten)]
    snapshot: SnapshotArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SnapshotArgs {
    /// CO₂ concentration (ppm)
    #[arg(long, global = true)]
    co2: Option<f64>,
    /// Temperature anomaly (°C)
    #[arg(long, global = true)]
    temperature: Option<f64>,
    /// Arctic ice coverage (%)
    #[arg(long, global = true)]
    arctic_ice: Option<f64>,
    /// Renewable share of electricity (%)
    #[arg(long, global = true)]
    renewable_energy: Option<f64>,
}

impl SnapshotArgs {
    fn snapshot(&self) -> EnvironmentalSnapshot {
        let defaults = EnvironmentalSnapshot::default();
        EnvironmentalSnapshot {
            co2: self.co2.unwrap_or(defaults.co2),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            arctic_ice: self.arctic_ice.unwrap_or(defaults.arctic_ice),
            renewable_energy: self.renewable_energy.unwrap_or(defaults.renewable_energy),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current tip
    Tip,
    /// Discard today's tips and generate new ones
    Refresh,
    /// Show engine diagnostics
    Stats,
    /// Run one generation cycle outside the cache and show the result
    Debug,
    /// Keep printing tips in rotation
    Watch {
        /// Seconds between tips (defaults to config)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many tips
        #[arg(long)]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("earth_wisdom=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::new(cli.data_dir.clone())?;
    let snapshot = cli.snapshot.snapshot();

    let generator = GeminiClient::new(config.gemini.clone())
        .context("Failed to create Gemini client")?;
    let engine = WisdomEngine::new(
        Arc::new(generator),
        Arc::new(JsonFileStore::new(config.cache_dir())),
        Arc::new(SystemClock),
        config.wisdom.policy(),
    );

    match cli.command {
        Commands::Tip => {
            println!("{}", engine.get_current_tip(&snapshot).await);
        }
        Commands::Refresh => {
            println!("{}", engine.force_refresh(&snapshot).await);
        }
        Commands::Stats => {
            println!("{}", serde_json::to_string_pretty(&engine.get_stats())?);
        }
        Commands::Debug => {
            let report = engine.debug_generate(&snapshot).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Watch { interval, count } => {
            let interval = config.wisdom.watch_interval(interval);
            let mut ticker = tokio::time::interval(interval);
            let mut served = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        println!("{}", engine.get_current_tip(&snapshot).await);
                        served += 1;
                        if count.map_or(false, |c| served >= c) {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    Ok(())
}
