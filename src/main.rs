//! CLI Entry Point for eeg-daq
//!
//! Provides command-line interface for:
//! - Running the acquisition pipeline against the simulated headset
//! - Checking a configuration file
//!
//! # Usage
//!
//! Run for ten seconds and print the final metrics as JSON:
//! ```bash
//! eeg-daq run --config config/eeg_daq.toml --duration 10 --json
//! ```
//!
//! Validate settings (file + `EEG_DAQ_` environment):
//! ```bash
//! eeg-daq check-config --config config/eeg_daq.toml
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use eeg_daq::config::AppConfig;
use eeg_daq::hardware::mock::{MockAdc, MockBleTransport};
use eeg_daq::logging;
use eeg_daq::metrics::MetricsSnapshot;
use eeg_daq::notify::{gatt, GattServer, MetricsNotifier};
use eeg_daq::pipeline::Pipeline;
use eeg_daq::AppResult;
use tracing::info;

#[derive(Parser)]
#[command(name = "eeg-daq")]
#[command(about = "Single-channel EEG acquisition with blink and attention metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline against the simulated headset
    Run {
        /// Configuration file (defaults to config/eeg_daq.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration: Option<u64>,

        /// Print the final metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate the configuration, then print the effective settings
    CheckConfig {
        /// Configuration file (defaults to config/eeg_daq.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            duration,
            json,
        } => run(config.as_deref(), duration.map(Duration::from_secs), json).await,
        Commands::CheckConfig { config } => check_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

async fn run(config_path: Option<&Path>, duration: Option<Duration>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    logging::init_from_config(&config)?;
    info!(name = %config.application.name, "Starting acquisition");

    let adc = Arc::new(MockAdc::from_config(
        &config.acquisition,
        &config.simulation,
    ));
    let pipeline = Pipeline::new();

    // Wireless side: bring-up runs as events arrive, the notifier waits for a target.
    let (transport, events) = MockBleTransport::new(config.notifier.auto_connect);
    let transport = Arc::new(transport);
    let server = GattServer::new();
    let notifier = MetricsNotifier::new(
        Arc::clone(pipeline.metrics()),
        Arc::clone(&transport),
        server.subscribe(),
        config.notifier.poll_interval,
    );
    let gatt_task = tokio::spawn(gatt::drive(server, events, Arc::clone(&transport)));
    let notifier_task = tokio::spawn(notifier.run());
    transport.register_app()?;

    let handle = pipeline.spawn(adc);

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                signal = tokio::signal::ctrl_c() => signal?,
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    let snapshot = handle.shutdown().await;
    notifier_task.abort();
    gatt_task.abort();

    info!(
        notifications = transport.notifications().len(),
        "Wireless notifications delivered"
    );
    print_snapshot(&snapshot, json)?;
    Ok(())
}

fn print_snapshot(snapshot: &MetricsSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        println!("Blink count:     {}", snapshot.blink_count);
        println!("Attention level: {}", snapshot.attention_level);
    }
    Ok(())
}

fn check_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("Configuration OK");
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
