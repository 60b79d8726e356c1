//! Transaction window scanner
//!
//! Pages backward through a wallet's signature history with a before-cursor,
//! keeps signatures inside `[now - lookback, now]` and above the stored
//! watermark, classifies each one and persists the resulting records.
//!
//! A wallet's scan is strictly sequential; concurrency lives one level up in
//! the engine's worker pool.

use super::db::TransferSink;
use super::shutdown::ShutdownSignal;
use super::types::SignatureRef;
use crate::ingest_core::address::{is_direct_wallet, parse_address};
use crate::ingest_core::error_handler::IngestError;
use crate::ingest_core::failover::LedgerExecutor;
use crate::ingest_core::rpc_client::{Commitment, MAX_SIGNATURE_PAGE};
use crate::ingest_core::trade_detector::TransferClassifier;
use std::sync::Arc;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub lookback_days: i64,
    pub page_size: usize,
    /// Treat the first already-stored signature as "caught up" and stop.
    /// When false, stored signatures are skipped and the scan continues down
    /// to the window/watermark bound.
    pub assume_monotonic_sync: bool,
    pub commitment: Commitment,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            page_size: MAX_SIGNATURE_PAGE,
            assume_monotonic_sync: true,
            commitment: Commitment::Confirmed,
        }
    }
}

/// Time bounds of one wallet pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanWindow {
    pub start: i64,
    pub end: i64,
    pub watermark: Option<i64>,
}

impl ScanWindow {
    pub fn new(now: i64, lookback_days: i64, watermark: Option<i64>) -> Self {
        Self {
            start: now.saturating_sub(lookback_days.saturating_mul(SECONDS_PER_DAY)),
            end: now,
            watermark,
        }
    }

    /// Entries without a block time are never in range
    pub fn contains(&self, block_time: Option<i64>) -> bool {
        match block_time {
            Some(t) => t >= self.start && t <= self.end && self.watermark.map_or(true, |w| t > w),
            None => false,
        }
    }

    /// True once `block_time` lies at or below the lower bound; everything
    /// older on later pages is out of range too.
    pub fn is_below(&self, block_time: i64) -> bool {
        block_time < self.start || self.watermark.map_or(false, |w| block_time <= w)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Address failed validation or is program-derived
    Skipped,
    /// History exhausted down to the window/watermark bound
    Completed,
    /// Hit an already-stored signature under the monotonic policy
    CaughtUp,
    /// Shutdown observed between upstream calls; watermark untouched
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub wallet: String,
    pub status: ScanStatus,
    pub pages: usize,
    pub inserted: usize,
    pub already_stored: usize,
    pub failed_writes: usize,
    /// Watermark after this pass
    pub watermark: Option<i64>,
}

impl ScanOutcome {
    fn new(wallet: &str, watermark: Option<i64>) -> Self {
        Self {
            wallet: wallet.to_string(),
            status: ScanStatus::Completed,
            pages: 0,
            inserted: 0,
            already_stored: 0,
            failed_writes: 0,
            watermark,
        }
    }
}

pub struct WalletScanner {
    executor: Arc<LedgerExecutor>,
    sink: Arc<dyn TransferSink>,
    classifier: Arc<TransferClassifier>,
    options: ScanOptions,
}

impl WalletScanner {
    pub fn new(
        executor: Arc<LedgerExecutor>,
        sink: Arc<dyn TransferSink>,
        classifier: Arc<TransferClassifier>,
        options: ScanOptions,
    ) -> Self {
        Self {
            executor,
            sink,
            classifier,
            options,
        }
    }

    pub async fn scan_wallet(
        &self,
        wallet: &str,
        mint: &str,
        shutdown: &ShutdownSignal,
    ) -> Result<ScanOutcome, IngestError> {
        self.scan_wallet_at(wallet, mint, chrono::Utc::now().timestamp(), shutdown)
            .await
    }

    /// Scan one wallet relative to an explicit `now` (seconds since epoch).
    ///
    /// Upstream exhaustion propagates as an error and leaves the watermark
    /// where it was. Per-record write failures are logged and counted, and
    /// hold the watermark back so a later pass can retry them.
    pub async fn scan_wallet_at(
        &self,
        wallet: &str,
        mint: &str,
        now: i64,
        shutdown: &ShutdownSignal,
    ) -> Result<ScanOutcome, IngestError> {
        let watermark = self.sink.get_watermark(wallet).await?;
        let mut outcome = ScanOutcome::new(wallet, watermark);

        match parse_address(wallet) {
            Ok(key) if is_direct_wallet(&key) => {}
            Ok(_) => {
                log::warn!("⚠️  Skipping derived address {} (not a direct wallet)", wallet);
                outcome.status = ScanStatus::Skipped;
                return Ok(outcome);
            }
            Err(e) => {
                log::warn!("⚠️  Skipping wallet {}: {}", wallet, e);
                outcome.status = ScanStatus::Skipped;
                return Ok(outcome);
            }
        }

        let window = ScanWindow::new(now, self.options.lookback_days, watermark);
        let page_size = self.options.page_size.clamp(1, MAX_SIGNATURE_PAGE);
        let mut before: Option<String> = None;
        let mut newest_inserted: Option<i64> = None;

        log::debug!(
            "🔎 Scanning {} (window {}..{}, watermark {:?})",
            wallet,
            window.start,
            window.end,
            watermark
        );

        'paging: loop {
            if shutdown.is_cancelled() {
                outcome.status = ScanStatus::Cancelled;
                break;
            }

            let page = self
                .executor
                .execute("getSignaturesForAddress", |rpc| {
                    let wallet = wallet.to_string();
                    let before = before.clone();
                    async move {
                        rpc.get_signatures_for_address(&wallet, page_size, before.as_deref())
                            .await
                    }
                })
                .await?;
            outcome.pages += 1;

            let Some(oldest) = page.last() else {
                break;
            };
            let reached_bound = oldest.block_time.map_or(false, |t| window.is_below(t));
            let end_of_history = page.len() < page_size;
            let cursor = oldest.signature.clone();

            let in_range: Vec<&SignatureRef> =
                page.iter().filter(|s| window.contains(s.block_time)).collect();
            if in_range.is_empty() {
                break;
            }

            for sig in in_range {
                if shutdown.is_cancelled() {
                    outcome.status = ScanStatus::Cancelled;
                    break 'paging;
                }

                if self.sink.signature_exists(&sig.signature).await? {
                    outcome.already_stored += 1;
                    if self.options.assume_monotonic_sync {
                        log::debug!("   └─ {} already stored, {} caught up", sig.signature, wallet);
                        outcome.status = ScanStatus::CaughtUp;
                        break 'paging;
                    }
                    continue;
                }

                let commitment = self.options.commitment;
                let detail = self
                    .executor
                    .execute("getTransaction", |rpc| {
                        let signature = sig.signature.clone();
                        async move { rpc.get_transaction_detail(&signature, commitment).await }
                    })
                    .await?;

                let Some(mut detail) = detail else {
                    log::debug!("Transaction {} not found, skipping", sig.signature);
                    continue;
                };
                if detail.block_time.is_none() {
                    detail.block_time = sig.block_time;
                }

                let Some(record) = self.classifier.classify(&detail, wallet, mint) else {
                    continue;
                };

                match self.sink.insert_transfer_if_absent(&record).await {
                    Ok(true) => {
                        outcome.inserted += 1;
                        newest_inserted = newest_inserted.max(Some(record.timestamp));
                    }
                    Ok(false) => outcome.already_stored += 1,
                    Err(e) => {
                        outcome.failed_writes += 1;
                        log::error!("❌ Failed to store transfer {}: {}", record.signature, e);
                    }
                }
            }

            if reached_bound || end_of_history {
                break;
            }
            before = Some(cursor);
        }

        if outcome.status != ScanStatus::Cancelled {
            if let Some(ts) = newest_inserted {
                if outcome.failed_writes > 0 {
                    log::warn!(
                        "⚠️  Holding watermark for {} at {:?}: {} transfers not stored",
                        wallet,
                        outcome.watermark,
                        outcome.failed_writes
                    );
                } else {
                    self.sink.advance_watermark(wallet, ts).await?;
                    outcome.watermark = outcome.watermark.max(Some(ts));
                }
            }
        }

        log::info!(
            "✅ {} {:?}: {} inserted, {} already stored, {} failed writes ({} pages)",
            wallet,
            outcome.status,
            outcome.inserted,
            outcome.already_stored,
            outcome.failed_writes,
            outcome.pages
        );

        Ok(outcome)
    }
}
