//! Holder discovery: rank the largest owners of a mint
//!
//! 1. Validate the mint before any network call
//! 2. Fetch every token account of the mint (via the failover executor)
//! 3. Drop zero balances, sort by raw amount, truncate to N
//! 4. Resolve owners, discarding malformed ones
//! 5. Re-sort by normalised balance, truncate, upsert into the sink
//!
//! Fewer than N holders is reported as a shortfall, never padded.

use super::db::TransferSink;
use super::types::{Holder, HolderSet, TokenAccount};
use crate::ingest_core::address::{is_valid_address, parse_address};
use crate::ingest_core::error_handler::IngestError;
use crate::ingest_core::failover::LedgerExecutor;
use crate::ingest_core::rpc_client::{TOKEN_ACCOUNT_SIZE, TOKEN_PROGRAM_ID};
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_HOLDER_COUNT: usize = 30;

pub struct HolderDiscovery {
    executor: Arc<LedgerExecutor>,
    sink: Arc<dyn TransferSink>,
}

impl HolderDiscovery {
    pub fn new(executor: Arc<LedgerExecutor>, sink: Arc<dyn TransferSink>) -> Self {
        Self { executor, sink }
    }

    pub async fn discover(&self, mint: &str, count: usize) -> Result<HolderSet, IngestError> {
        parse_address(mint)?;

        log::info!("🔍 Fetching token accounts for mint {}", mint);

        let mint_owned = mint.to_string();
        let accounts = self
            .executor
            .execute("getProgramAccounts", move |rpc| {
                let mint = mint_owned.clone();
                async move {
                    rpc.scan_program_accounts(TOKEN_PROGRAM_ID, &mint, TOKEN_ACCOUNT_SIZE)
                        .await
                }
            })
            .await?;

        log::info!("   ├─ Retrieved {} token accounts", accounts.len());

        let holders = rank_holders(mint, accounts, count);
        let set = HolderSet {
            mint: mint.to_string(),
            requested: count,
            holders,
        };

        if set.shortfall() > 0 {
            log::warn!(
                "⚠️  Only {} valid holders found for {}, requested {}",
                set.holders.len(),
                mint,
                count
            );
        }

        self.sink.upsert_holders(&set.holders, mint).await?;
        log::info!("   └─ Stored {} holders", set.holders.len());

        Ok(set)
    }
}

/// Pure ranking step of discovery.
///
/// Raw ordering and truncation happen before owner resolution so the
/// resolution work is bounded by `count`. When one owner holds several of the
/// top accounts only its largest is kept.
pub fn rank_holders(mint: &str, accounts: Vec<TokenAccount>, count: usize) -> Vec<Holder> {
    let mut funded: Vec<(u64, TokenAccount)> = accounts
        .into_iter()
        .filter_map(|account| {
            let raw = account.amount.amount.parse::<u64>().ok()?;
            (raw > 0).then_some((raw, account))
        })
        .collect();

    funded.sort_by(|a, b| b.0.cmp(&a.0));
    funded.truncate(count);

    let mut seen = HashSet::new();
    let mut holders: Vec<Holder> = Vec::with_capacity(funded.len());

    for (raw, account) in funded {
        let owner = match account.owner {
            Some(owner) if is_valid_address(&owner) => owner,
            other => {
                log::debug!("Skipping account {}: invalid owner {:?}", account.address, other);
                continue;
            }
        };

        if !seen.insert(owner.clone()) {
            log::debug!("Owner {} already ranked, skipping account {}", owner, account.address);
            continue;
        }

        let balance = raw as f64 / 10f64.powi(account.amount.decimals as i32);
        holders.push(Holder {
            address: owner,
            balance,
            mint: mint.to_string(),
        });
    }

    holders.sort_by(|a, b| {
        b.balance
            .partial_cmp(&a.balance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.address.cmp(&b.address))
    });
    holders.truncate(count);
    holders
}
