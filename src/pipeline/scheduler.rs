//! Periodic cycle trigger

use super::engine::IngestionEngine;
use super::shutdown::ShutdownSignal;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Run `engine.run_cycle` every `interval_secs` until shutdown.
///
/// The first cycle starts immediately. A failed cycle is logged and the
/// schedule continues. Returns the number of cycles that completed.
pub async fn periodic_cycle_task(
    engine: Arc<IngestionEngine>,
    interval_secs: u64,
    shutdown: ShutdownSignal,
) -> u64 {
    log::info!("⏰ Starting cycle scheduler (interval: {}s)", interval_secs);

    let mut timer = interval(Duration::from_secs(interval_secs.max(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0u64;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = timer.tick() => {}
        }

        match engine.run_cycle(&shutdown).await {
            Ok(report) => {
                completed += 1;
                if report.cancelled() {
                    break;
                }
            }
            Err(e) => {
                log::error!("❌ Ingestion cycle failed: {}", e);
            }
        }

        if shutdown.is_cancelled() {
            break;
        }
    }

    log::info!("🛑 Cycle scheduler stopped after {} cycles", completed);
    completed
}
