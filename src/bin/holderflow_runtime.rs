//! Holderflow Runtime
//!
//! Discovers the top holders of `HOLDERFLOW_TARGET_MINT` and ingests their
//! transfers, either once (`--once`) or every `CYCLE_INTERVAL_SECS` until
//! CTRL+C.
//!
//! Usage:
//!   cargo run --release --bin holderflow_runtime -- [--once]
//!
//! See `IngestConfig::from_env` for the environment variables.

use clap::Parser;
use dotenv::dotenv;
use holderflow::ingest_core::IngestConfig;
use holderflow::pipeline::{scheduler::periodic_cycle_task, shutdown, IngestionEngine, SqliteTransferSink};
use log::{error, info};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Top-holder transfer ingestion", long_about = None)]
struct Args {
    /// Run a single discovery + scan cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    info!("🚀 Holderflow Runtime");
    info!("   └─ Mode: {}", if args.once { "one-shot" } else { "periodic" });

    let config = IngestConfig::from_env()?;
    config.log_summary();

    let sink = Arc::new(SqliteTransferSink::open(&config.db_path)?);
    sink.ready().await?;
    info!("✅ Database initialized at {}", config.db_path);

    let engine = Arc::new(IngestionEngine::from_config(&config, sink)?);
    let (handle, signal) = shutdown::channel();

    if args.once {
        tokio::select! {
            result = engine.run_cycle(&signal) => {
                let report = result?;
                info!("✅ Cycle finished: {} transfers inserted", report.transfers_inserted);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("⚠️  Received CTRL+C, abandoning cycle");
                handle.trigger();
            }
        }
        return Ok(());
    }

    let task = tokio::spawn(periodic_cycle_task(
        engine.clone(),
        config.cycle_interval_secs,
        signal,
    ));

    info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("");
            info!("⚠️  Received CTRL+C, shutting down...");
        }
        Err(err) => {
            error!("❌ Failed to listen for CTRL+C: {}", err);
        }
    }

    handle.trigger();

    match task.await {
        Ok(cycles) => info!("✅ Holderflow runtime stopped after {} cycles", cycles),
        Err(e) => error!("❌ Scheduler task ended abnormally: {}", e),
    }

    Ok(())
}
