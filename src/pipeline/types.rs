//! Core data model: holders, signature references, transfer records

use serde::{Deserialize, Serialize};
use solana_account_decoder_client_types::token::UiTokenAmount;

/// An owner address holding a nonzero balance of the tracked mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    /// Raw amount divided by 10^decimals
    pub balance: f64,
    pub mint: String,
}

/// Result of one discovery pass
#[derive(Debug, Clone)]
pub struct HolderSet {
    pub mint: String,
    pub requested: usize,
    /// Strictly descending by balance, at most `requested` entries
    pub holders: Vec<Holder>,
}

impl HolderSet {
    /// How many holders are missing relative to the requested count.
    /// Never padded.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.holders.len())
    }
}

/// One entry of an address's signature history
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRef {
    pub signature: String,
    pub wallet: String,
    /// Seconds since epoch; absent for very old or unconfirmed entries
    pub block_time: Option<i64>,
}

/// A token account holding the tracked mint, as returned by the program scan
#[derive(Debug, Clone)]
pub struct TokenAccount {
    pub address: String,
    pub mint: String,
    pub owner: Option<String>,
    pub amount: UiTokenAmount,
}

/// Pre- or post-transaction balance of one token account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: u8,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

/// The parts of a confirmed transaction needed for classification
#[derive(Debug, Clone)]
pub struct TransactionDetail {
    pub signature: String,
    pub block_time: Option<i64>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
    /// Outer then inner program ids, first occurrence order
    pub program_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "BUY",
            TradeDirection::Sell => "SELL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BUY" => Some(TradeDirection::Buy),
            "SELL" => Some(TradeDirection::Sell),
            _ => None,
        }
    }
}

/// A classified buy or sell of the tracked mint. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub signature: String,
    pub wallet: String,
    /// Tracked-mint amount, always > 0
    pub amount: f64,
    pub direction: TradeDirection,
    /// Counter amount per tracked unit; `None` when no counter-asset moved
    pub price: Option<f64>,
    pub venue: crate::ingest_core::venue::Venue,
    pub counter_mint: Option<String>,
    pub timestamp: i64,
}
