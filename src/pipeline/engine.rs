//! Ingestion engine: one discovery + scan cycle
//!
//! ```text
//! HolderDiscovery::discover()
//!     ↓ ranked holders
//! worker pool (buffer_unordered, MAX_CONCURRENT_WALLETS)
//!     ↓ throttle delay, then one sequential scan per wallet
//! WalletScanner::scan_wallet()
//!     ↓
//! TransferSink (records + watermarks)
//! ```
//!
//! A failed wallet never aborts the cycle. Only discovery failure does.

use super::db::{SqliteTransferSink, TransferSink};
use super::holders::HolderDiscovery;
use super::scanner::{ScanOptions, ScanOutcome, ScanStatus, WalletScanner};
use super::shutdown::ShutdownSignal;
use crate::ingest_core::config::IngestConfig;
use crate::ingest_core::error_handler::IngestError;
use crate::ingest_core::failover::LedgerExecutor;
use crate::ingest_core::rpc_client::{JsonRpcClient, LedgerRpc};
use crate::ingest_core::trade_detector::TransferClassifier;
use crate::ingest_core::venue::VenueRegistry;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub mint: String,
    pub holder_count: usize,
    /// Cooperative throttle before each wallet scan
    pub wallet_scan_delay: Duration,
    /// Worker-pool size; 1 keeps wallets strictly sequential
    pub max_concurrent_wallets: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub mint: String,
    pub holders_found: usize,
    pub shortfall: usize,
    pub wallets_scanned: usize,
    pub wallets_caught_up: usize,
    pub wallets_skipped: usize,
    pub wallets_failed: usize,
    pub wallets_cancelled: usize,
    pub transfers_inserted: usize,
    pub writes_failed: usize,
}

impl CycleReport {
    pub fn cancelled(&self) -> bool {
        self.wallets_cancelled > 0
    }

    fn record(&mut self, outcome: &ScanOutcome) {
        match outcome.status {
            ScanStatus::Skipped => self.wallets_skipped += 1,
            ScanStatus::Cancelled => self.wallets_cancelled += 1,
            ScanStatus::CaughtUp => {
                self.wallets_scanned += 1;
                self.wallets_caught_up += 1;
            }
            ScanStatus::Completed => self.wallets_scanned += 1,
        }
        self.transfers_inserted += outcome.inserted;
        self.writes_failed += outcome.failed_writes;
    }

    pub fn log_summary(&self, elapsed: Duration) {
        log::info!("📊 Cycle complete for {} in {:.1}s", self.mint, elapsed.as_secs_f64());
        log::info!("   ├─ Holders: {} (shortfall {})", self.holders_found, self.shortfall);
        log::info!(
            "   ├─ Wallets: {} scanned ({} caught up), {} skipped, {} failed, {} cancelled",
            self.wallets_scanned,
            self.wallets_caught_up,
            self.wallets_skipped,
            self.wallets_failed,
            self.wallets_cancelled
        );
        log::info!("   ├─ Transfers inserted: {}", self.transfers_inserted);
        log::info!("   └─ Writes failed: {}", self.writes_failed);
    }
}

pub struct IngestionEngine {
    discovery: HolderDiscovery,
    scanner: WalletScanner,
    settings: EngineSettings,
}

impl IngestionEngine {
    pub fn new(discovery: HolderDiscovery, scanner: WalletScanner, settings: EngineSettings) -> Self {
        Self {
            discovery,
            scanner,
            settings,
        }
    }

    /// Wire the production stack: one `JsonRpcClient` per configured URL
    /// behind the failover executor, writing into `sink`.
    pub fn from_config(config: &IngestConfig, sink: Arc<SqliteTransferSink>) -> Result<Self, IngestError> {
        let clients = config
            .rpc_urls
            .iter()
            .map(|url| {
                JsonRpcClient::new(url.clone(), config.rpc_timeout())
                    .map(|client| Arc::new(client) as Arc<dyn LedgerRpc>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let executor = Arc::new(LedgerExecutor::from_clients(clients, config.retry_policy())?);
        log::info!(
            "🔗 Failover pool: {} endpoints ({})",
            executor.endpoint_count(),
            executor.endpoint_labels().join(", ")
        );
        let sink: Arc<dyn TransferSink> = sink;
        let classifier = Arc::new(TransferClassifier::new(VenueRegistry::new(
            config.venue_substring_fallback,
        )));

        let discovery = HolderDiscovery::new(executor.clone(), sink.clone());
        let scanner = WalletScanner::new(
            executor,
            sink,
            classifier,
            ScanOptions {
                lookback_days: config.lookback_days,
                page_size: config.page_size,
                assume_monotonic_sync: config.assume_monotonic_sync,
                commitment: config.commitment,
            },
        );

        Ok(Self::new(
            discovery,
            scanner,
            EngineSettings {
                mint: config.target_mint.clone(),
                holder_count: config.holder_count,
                wallet_scan_delay: Duration::from_millis(config.wallet_scan_delay_ms),
                max_concurrent_wallets: config.max_concurrent_wallets,
            },
        ))
    }

    /// Discover holders, then scan each of them through the bounded pool.
    ///
    /// Returns `Err` only when discovery itself fails.
    pub async fn run_cycle(&self, shutdown: &ShutdownSignal) -> Result<CycleReport, IngestError> {
        let started = Instant::now();
        let mint = self.settings.mint.as_str();

        log::info!("🚀 Starting ingestion cycle for {}", mint);

        let holders = self
            .discovery
            .discover(mint, self.settings.holder_count)
            .await?;

        let mut report = CycleReport {
            mint: mint.to_string(),
            holders_found: holders.holders.len(),
            shortfall: holders.shortfall(),
            ..Default::default()
        };

        let scanner = &self.scanner;
        let delay = self.settings.wallet_scan_delay;
        let workers = self.settings.max_concurrent_wallets.max(1);

        let wallets: Vec<String> = holders.holders.iter().map(|h| h.address.clone()).collect();

        let mut scans = stream::iter(wallets)
            .map(|wallet| async move {
                tokio::select! {
                    _ = shutdown.cancelled() => return (wallet, None),
                    _ = tokio::time::sleep(delay) => {}
                }
                let result = scanner.scan_wallet(&wallet, mint, shutdown).await;
                (wallet, Some(result))
            })
            .buffer_unordered(workers);

        while let Some((wallet, result)) = scans.next().await {
            match result {
                Some(Ok(outcome)) => report.record(&outcome),
                Some(Err(e)) => {
                    report.wallets_failed += 1;
                    log::error!("❌ Scan failed for {}: {}", wallet, e);
                }
                None => {
                    report.wallets_cancelled += 1;
                    log::debug!("Scan for {} not started, shutting down", wallet);
                }
            }
        }

        report.log_summary(started.elapsed());
        Ok(report)
    }
}
