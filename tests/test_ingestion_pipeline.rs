//! End-to-end pipeline tests against an in-memory ledger
//!
//! Drives discovery, the window scanner and the cycle engine through the real
//! failover executor and SQLite sink, with a scripted `LedgerRpc` upstream.

use async_trait::async_trait;
use holderflow::ingest_core::error_handler::IngestError;
use holderflow::ingest_core::failover::{LedgerExecutor, RetryPolicy};
use holderflow::ingest_core::rpc_client::{Commitment, LedgerRpc};
use holderflow::ingest_core::{TransferClassifier, Venue, VenueRegistry};
use holderflow::pipeline::engine::{EngineSettings, IngestionEngine};
use holderflow::pipeline::scheduler::periodic_cycle_task;
use holderflow::pipeline::types::{
    Holder, SignatureRef, TokenAccount, TokenBalance, TransactionDetail, TransferRecord,
};
use holderflow::pipeline::{
    shutdown, HolderDiscovery, ScanOptions, ScanStatus, ShutdownSignal, SqliteTransferSink,
    TradeDirection, TransferSink, WalletScanner,
};
use solana_account_decoder_client_types::token::UiTokenAmount;
use solana_pubkey::Pubkey;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const SOL: &str = "So11111111111111111111111111111111111111112";
const WALLET: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const OTHER_WALLET: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";
const JUPITER: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
const NOW: i64 = 1_700_000_000;

// ============================================================================
// Scripted upstream
// ============================================================================

#[derive(Default)]
struct MockLedger {
    label: String,
    rate_limited: bool,
    accounts: Vec<TokenAccount>,
    /// Newest first, per wallet
    history: HashMap<String, Vec<SignatureRef>>,
    transactions: HashMap<String, TransactionDetail>,
    calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl MockLedger {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn rate_limited(label: &str) -> Self {
        Self {
            rate_limited: true,
            ..Self::new(label)
        }
    }

    fn with_account(mut self, address: &str, owner: &str, raw: u64) -> Self {
        self.accounts.push(TokenAccount {
            address: address.to_string(),
            mint: MINT.to_string(),
            owner: Some(owner.to_string()),
            amount: ui_amount(raw, 6),
        });
        self
    }

    /// Adds a BUY of `raw_bought` (6 decimals) paid with 0.1 SOL
    fn with_buy(mut self, wallet: &str, signature: &str, block_time: i64, raw_bought: u64) -> Self {
        self.history
            .entry(wallet.to_string())
            .or_default()
            .push(SignatureRef {
                signature: signature.to_string(),
                wallet: wallet.to_string(),
                block_time: Some(block_time),
            });
        self.transactions.insert(
            signature.to_string(),
            TransactionDetail {
                signature: signature.to_string(),
                block_time: Some(block_time),
                pre_token_balances: vec![
                    balance(1, wallet, MINT, 1_000_000, 6),
                    balance(2, wallet, SOL, 500_000_000, 9),
                ],
                post_token_balances: vec![
                    balance(1, wallet, MINT, 1_000_000 + raw_bought, 6),
                    balance(2, wallet, SOL, 400_000_000, 9),
                ],
                program_ids: vec![JUPITER.to_string()],
            },
        );
        self
    }

    fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited {
            return Err(IngestError::RateLimited {
                endpoint: self.label.clone(),
                message: "429 Too Many Requests".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn endpoint(&self) -> &str {
        &self.label
    }

    async fn scan_program_accounts(
        &self,
        _program: &str,
        mint: &str,
        _data_size: u64,
    ) -> Result<Vec<TokenAccount>, IngestError> {
        self.check()?;
        Ok(self.accounts.iter().filter(|a| a.mint == mint).cloned().collect())
    }

    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<SignatureRef>, IngestError> {
        self.check()?;
        let history = self.history.get(address).cloned().unwrap_or_default();
        let start = match before {
            Some(cursor) => history
                .iter()
                .position(|s| s.signature == cursor)
                .map(|i| i + 1)
                .unwrap_or(history.len()),
            None => 0,
        };
        Ok(history.into_iter().skip(start).take(limit).collect())
    }

    async fn get_transaction_detail(
        &self,
        signature: &str,
        _commitment: Commitment,
    ) -> Result<Option<TransactionDetail>, IngestError> {
        self.check()?;
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.transactions.get(signature).cloned())
    }
}

/// Sink that refuses to store selected signatures until healed
struct FlakySink {
    inner: SqliteTransferSink,
    reject: Mutex<HashSet<String>>,
}

impl FlakySink {
    fn rejecting(signatures: &[&str]) -> Self {
        Self {
            inner: SqliteTransferSink::in_memory().unwrap(),
            reject: Mutex::new(signatures.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn heal(&self) {
        self.reject.lock().unwrap().clear();
    }
}

#[async_trait]
impl TransferSink for FlakySink {
    async fn upsert_holders(&self, holders: &[Holder], mint: &str) -> Result<(), IngestError> {
        self.inner.upsert_holders(holders, mint).await
    }

    async fn insert_transfer_if_absent(&self, record: &TransferRecord) -> Result<bool, IngestError> {
        let rejected = self.reject.lock().unwrap().contains(&record.signature);
        if rejected {
            return Err(IngestError::PersistenceWrite("disk full".to_string()));
        }
        self.inner.insert_transfer_if_absent(record).await
    }

    async fn get_watermark(&self, wallet: &str) -> Result<Option<i64>, IngestError> {
        self.inner.get_watermark(wallet).await
    }

    async fn advance_watermark(&self, wallet: &str, timestamp: i64) -> Result<(), IngestError> {
        self.inner.advance_watermark(wallet, timestamp).await
    }

    async fn signature_exists(&self, signature: &str) -> Result<bool, IngestError> {
        self.inner.signature_exists(signature).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ui_amount(raw: u64, decimals: u8) -> UiTokenAmount {
    let ui = raw as f64 / 10f64.powi(decimals as i32);
    UiTokenAmount {
        ui_amount: Some(ui),
        decimals,
        amount: raw.to_string(),
        ui_amount_string: ui.to_string(),
    }
}

fn balance(index: u8, owner: &str, mint: &str, raw: u64, decimals: u8) -> TokenBalance {
    TokenBalance {
        account_index: index,
        mint: mint.to_string(),
        owner: Some(owner.to_string()),
        ui_token_amount: ui_amount(raw, decimals),
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        max_in_flight: 4,
    }
}

fn executor(endpoints: Vec<Arc<MockLedger>>) -> Arc<LedgerExecutor> {
    let clients = endpoints
        .into_iter()
        .map(|m| m as Arc<dyn LedgerRpc>)
        .collect();
    Arc::new(LedgerExecutor::from_clients(clients, fast_policy()).unwrap())
}

fn scanner(
    ledger: Arc<MockLedger>,
    sink: Arc<dyn TransferSink>,
    page_size: usize,
    assume_monotonic_sync: bool,
) -> WalletScanner {
    WalletScanner::new(
        executor(vec![ledger]),
        sink,
        Arc::new(TransferClassifier::new(VenueRegistry::default())),
        ScanOptions {
            lookback_days: 7,
            page_size,
            assume_monotonic_sync,
            commitment: Commitment::Confirmed,
        },
    )
}

fn never() -> ShutdownSignal {
    ShutdownSignal::never()
}

// ============================================================================
// Holder discovery
// ============================================================================

#[tokio::test]
async fn test_discovery_ranks_holders_and_persists_them() {
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_account("acct1", WALLET, 2_000_000)
            .with_account("acct2", OTHER_WALLET, 9_000_000)
            .with_account("acct3", JUPITER, 0)
            .with_account("acct4", "bad owner", 50_000_000),
    );
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let discovery = HolderDiscovery::new(executor(vec![ledger]), sink.clone());

    let set = discovery.discover(MINT, 30).await.unwrap();

    assert_eq!(set.holders.len(), 2);
    assert_eq!(set.holders[0].address, OTHER_WALLET);
    assert_eq!(set.holders[0].balance, 9.0);
    assert_eq!(set.holders[1].address, WALLET);
    assert_eq!(set.shortfall(), 28);

    let stored = sink.current_holders(MINT, 30).await.unwrap();
    assert_eq!(stored, set.holders);
}

#[tokio::test]
async fn test_malformed_mint_rejected_before_any_network_call() {
    let ledger = Arc::new(MockLedger::new("primary"));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let discovery = HolderDiscovery::new(executor(vec![ledger.clone()]), sink);

    for bad in ["short", "0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v!"] {
        let err = discovery.discover(bad, 30).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)), "{} -> {:?}", bad, err);
    }
    assert_eq!(ledger.total_calls(), 0);
}

#[tokio::test]
async fn test_discovery_fails_over_from_rate_limited_endpoint() {
    let a = Arc::new(MockLedger::rate_limited("A"));
    let b = Arc::new(MockLedger::new("B").with_account("acct1", WALLET, 1_000_000));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let discovery = HolderDiscovery::new(executor(vec![a.clone(), b.clone()]), sink);

    let set = discovery.discover(MINT, 30).await.unwrap();

    assert_eq!(set.holders.len(), 1);
    assert_eq!(a.total_calls(), 3);
    assert_eq!(b.total_calls(), 1);
}

#[tokio::test]
async fn test_discovery_reports_exhaustion() {
    let a = Arc::new(MockLedger::rate_limited("A"));
    let b = Arc::new(MockLedger::rate_limited("B"));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let discovery = HolderDiscovery::new(executor(vec![a, b]), sink);

    let err = discovery.discover(MINT, 30).await.unwrap_err();
    assert!(matches!(err, IngestError::AllEndpointsExhausted { endpoints: 2, .. }));
}

// ============================================================================
// Window scanner
// ============================================================================

#[tokio::test]
async fn test_scan_inserts_then_watermark_rescan_inserts_nothing() {
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_buy(WALLET, "sig3", NOW - 100, 500)
            .with_buy(WALLET, "sig2", NOW - 200, 500)
            .with_buy(WALLET, "sig1", NOW - 300, 500),
    );
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let scanner = scanner(ledger.clone(), sink.clone(), 1000, true);

    let first = scanner.scan_wallet_at(WALLET, MINT, NOW, &never()).await.unwrap();
    assert_eq!(first.status, ScanStatus::Completed);
    assert_eq!(first.inserted, 3);
    assert_eq!(first.watermark, Some(NOW - 100));
    assert_eq!(sink.get_watermark(WALLET).await.unwrap(), Some(NOW - 100));

    let records = sink.wallet_transfers(WALLET, 0, NOW).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].signature, "sig3");
    assert_eq!(records[0].direction, TradeDirection::Buy);
    assert_eq!(records[0].amount, 0.0005);
    assert_eq!(records[0].price, Some(200.0));
    assert_eq!(records[0].venue, Venue::Jupiter);
    assert_eq!(records[0].counter_mint.as_deref(), Some(SOL));

    let details_before = ledger.detail_calls.load(Ordering::SeqCst);
    let second = scanner.scan_wallet_at(WALLET, MINT, NOW, &never()).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(ledger.detail_calls.load(Ordering::SeqCst), details_before);
    assert_eq!(sink.transfer_count(WALLET).await.unwrap(), 3);
}

#[tokio::test]
async fn test_signatures_outside_window_are_ignored() {
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_buy(WALLET, "recent", NOW - 60, 500)
            .with_buy(WALLET, "stale", NOW - 8 * 86_400, 500),
    );
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let scanner = scanner(ledger, sink.clone(), 1000, true);

    let outcome = scanner.scan_wallet_at(WALLET, MINT, NOW, &never()).await.unwrap();

    assert_eq!(outcome.inserted, 1);
    assert!(!sink.signature_exists("stale").await.unwrap());
}

#[tokio::test]
async fn test_paging_follows_before_cursor() {
    let mut ledger = MockLedger::new("primary");
    for i in 0..5 {
        ledger = ledger.with_buy(WALLET, &format!("sig{}", 5 - i), NOW - 100 * (i + 1), 500);
    }
    let ledger = Arc::new(ledger);
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let scanner = scanner(ledger, sink.clone(), 2, true);

    let outcome = scanner.scan_wallet_at(WALLET, MINT, NOW, &never()).await.unwrap();

    assert_eq!(outcome.inserted, 5);
    assert_eq!(outcome.pages, 3);
    assert_eq!(sink.transfer_count(WALLET).await.unwrap(), 5);
}

#[tokio::test]
async fn test_monotonic_policy_stops_at_first_stored_signature() {
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_buy(WALLET, "sig3", NOW - 100, 500)
            .with_buy(WALLET, "sig2", NOW - 200, 500)
            .with_buy(WALLET, "sig1", NOW - 300, 500),
    );

    // sig3 stored by an earlier, interrupted pass that never set a watermark
    let seed = |sink: Arc<SqliteTransferSink>| async move {
        sink.insert_transfer_if_absent(&TransferRecord {
            signature: "sig3".to_string(),
            wallet: WALLET.to_string(),
            amount: 0.0005,
            direction: TradeDirection::Buy,
            price: None,
            venue: Venue::Unknown,
            counter_mint: None,
            timestamp: NOW - 100,
        })
        .await
        .unwrap();
        sink
    };

    let optimistic = seed(Arc::new(SqliteTransferSink::in_memory().unwrap())).await;
    let outcome = scanner(ledger.clone(), optimistic.clone(), 1000, true)
        .scan_wallet_at(WALLET, MINT, NOW, &never())
        .await
        .unwrap();
    assert_eq!(outcome.status, ScanStatus::CaughtUp);
    assert_eq!(outcome.inserted, 0);
    assert_eq!(optimistic.transfer_count(WALLET).await.unwrap(), 1);

    let thorough = seed(Arc::new(SqliteTransferSink::in_memory().unwrap())).await;
    let outcome = scanner(ledger, thorough.clone(), 1000, false)
        .scan_wallet_at(WALLET, MINT, NOW, &never())
        .await
        .unwrap();
    assert_eq!(outcome.status, ScanStatus::Completed);
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.already_stored, 1);
    assert_eq!(thorough.transfer_count(WALLET).await.unwrap(), 3);
}

#[tokio::test]
async fn test_derived_and_malformed_wallets_are_skipped() {
    let ledger = Arc::new(MockLedger::new("primary"));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let scanner = scanner(ledger.clone(), sink, 1000, true);

    let program: Pubkey = JUPITER.parse().unwrap();
    let (pda, _) = Pubkey::find_program_address(&[b"holderflow"], &program);

    for wallet in [pda.to_string(), "definitely-not-base58!".to_string()] {
        let outcome = scanner.scan_wallet_at(&wallet, MINT, NOW, &never()).await.unwrap();
        assert_eq!(outcome.status, ScanStatus::Skipped);
    }
    assert_eq!(ledger.total_calls(), 0);
}

#[tokio::test]
async fn test_write_failure_does_not_abort_the_scan() {
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_buy(WALLET, "sig3", NOW - 100, 500)
            .with_buy(WALLET, "sig2", NOW - 200, 500)
            .with_buy(WALLET, "sig1", NOW - 300, 500),
    );
    let sink = Arc::new(FlakySink::rejecting(&["sig2"]));
    let scanner = scanner(ledger, sink.clone(), 1000, true);

    let outcome = scanner.scan_wallet_at(WALLET, MINT, NOW, &never()).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.failed_writes, 1);
    assert!(sink.signature_exists("sig1").await.unwrap());
    assert!(!sink.signature_exists("sig2").await.unwrap());
}

#[tokio::test]
async fn test_failed_write_holds_watermark_until_retried() {
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_buy(WALLET, "sig3", NOW - 100, 500)
            .with_buy(WALLET, "sig2", NOW - 200, 500)
            .with_buy(WALLET, "sig1", NOW - 300, 500),
    );
    let sink = Arc::new(FlakySink::rejecting(&["sig2"]));
    sink.advance_watermark(WALLET, NOW - 1_000).await.unwrap();

    let first = scanner(ledger.clone(), sink.clone(), 1000, true)
        .scan_wallet_at(WALLET, MINT, NOW, &never())
        .await
        .unwrap();
    assert_eq!(first.failed_writes, 1);
    assert_eq!(first.watermark, Some(NOW - 1_000));
    assert_eq!(sink.get_watermark(WALLET).await.unwrap(), Some(NOW - 1_000));

    sink.heal();
    let retry = scanner(ledger, sink.clone(), 1000, false)
        .scan_wallet_at(WALLET, MINT, NOW, &never())
        .await
        .unwrap();

    assert_eq!(retry.inserted, 1);
    assert_eq!(retry.already_stored, 2);
    assert_eq!(retry.failed_writes, 0);
    assert!(sink.signature_exists("sig2").await.unwrap());
    assert_eq!(sink.get_watermark(WALLET).await.unwrap(), Some(NOW - 200));
}

#[tokio::test]
async fn test_cancelled_scan_leaves_watermark_untouched() {
    let ledger = Arc::new(MockLedger::new("primary").with_buy(WALLET, "sig1", NOW - 100, 500));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let scanner = scanner(ledger.clone(), sink.clone(), 1000, true);

    let (handle, signal) = shutdown::channel();
    handle.trigger();

    let outcome = scanner.scan_wallet_at(WALLET, MINT, NOW, &signal).await.unwrap();

    assert_eq!(outcome.status, ScanStatus::Cancelled);
    assert_eq!(outcome.inserted, 0);
    assert_eq!(sink.get_watermark(WALLET).await.unwrap(), None);
    assert_eq!(ledger.total_calls(), 0);
}

#[tokio::test]
async fn test_exhausted_scan_propagates_and_keeps_watermark() {
    let a = Arc::new(MockLedger::rate_limited("A"));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    sink.advance_watermark(WALLET, NOW - 1_000).await.unwrap();
    let scanner = scanner(a, sink.clone(), 1000, true);

    let err = scanner.scan_wallet_at(WALLET, MINT, NOW, &never()).await.unwrap_err();

    assert!(matches!(err, IngestError::AllEndpointsExhausted { .. }));
    assert_eq!(sink.get_watermark(WALLET).await.unwrap(), Some(NOW - 1_000));
}

// ============================================================================
// Cycle engine
// ============================================================================

fn engine(ledgers: Vec<Arc<MockLedger>>, sink: Arc<SqliteTransferSink>, workers: usize) -> IngestionEngine {
    let executor = executor(ledgers);
    let sink: Arc<dyn TransferSink> = sink;
    IngestionEngine::new(
        HolderDiscovery::new(executor.clone(), sink.clone()),
        WalletScanner::new(
            executor,
            sink,
            Arc::new(TransferClassifier::new(VenueRegistry::default())),
            ScanOptions::default(),
        ),
        EngineSettings {
            mint: MINT.to_string(),
            holder_count: 30,
            wallet_scan_delay: Duration::from_millis(1),
            max_concurrent_wallets: workers,
        },
    )
}

#[tokio::test]
async fn test_full_cycle_with_failover_and_worker_pool() {
    let now = chrono::Utc::now().timestamp();
    let a = Arc::new(MockLedger::rate_limited("A"));
    let b = Arc::new(
        MockLedger::new("B")
            .with_account("acct1", WALLET, 5_000_000)
            .with_account("acct2", OTHER_WALLET, 3_000_000)
            .with_buy(WALLET, "w1-b", now - 60, 500)
            .with_buy(WALLET, "w1-a", now - 120, 500)
            .with_buy(OTHER_WALLET, "w2-a", now - 90, 250),
    );

    let dir = TempDir::new().unwrap();
    let sink = Arc::new(SqliteTransferSink::open(dir.path().join("cycle.db")).unwrap());
    let engine = engine(vec![a, b], sink.clone(), 2);

    let report = engine.run_cycle(&never()).await.unwrap();

    assert_eq!(report.holders_found, 2);
    assert_eq!(report.wallets_scanned, 2);
    assert_eq!(report.wallets_failed, 0);
    assert_eq!(report.transfers_inserted, 3);
    assert!(!report.cancelled());
    assert_eq!(sink.get_watermark(WALLET).await.unwrap(), Some(now - 60));

    let again = engine.run_cycle(&never()).await.unwrap();
    assert_eq!(again.transfers_inserted, 0);
}

#[tokio::test]
async fn test_cycle_cancelled_before_scans_start() {
    let ledger = Arc::new(MockLedger::new("primary").with_account("acct1", WALLET, 5_000_000));
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let engine = engine(vec![ledger], sink, 1);

    let (handle, signal) = shutdown::channel();
    handle.trigger();

    let report = engine.run_cycle(&signal).await.unwrap();

    assert_eq!(report.holders_found, 1);
    assert_eq!(report.wallets_cancelled, 1);
    assert_eq!(report.wallets_scanned, 0);
}

#[tokio::test]
async fn test_periodic_task_runs_cycles_until_shutdown() {
    let now = chrono::Utc::now().timestamp();
    let ledger = Arc::new(
        MockLedger::new("primary")
            .with_account("acct1", WALLET, 5_000_000)
            .with_buy(WALLET, "tick-1", now - 30, 500),
    );
    let sink = Arc::new(SqliteTransferSink::in_memory().unwrap());
    let engine = Arc::new(engine(vec![ledger], sink.clone(), 1));

    let (handle, signal) = shutdown::channel();
    let task = tokio::spawn(periodic_cycle_task(engine, 60, signal));

    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.trigger();

    let completed = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("scheduler did not stop after shutdown")
        .unwrap();

    assert_eq!(completed, 1);
    assert!(sink.signature_exists("tick-1").await.unwrap());
}
