//! Wallet activity summaries over stored transfers

use super::types::{TradeDirection, TransferRecord};
use crate::ingest_core::venue::Venue;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSummary {
    pub total: usize,
    pub buys: usize,
    pub sells: usize,
    pub buy_volume: f64,
    pub sell_volume: f64,
    /// Mean over priced records only
    pub avg_buy_price: Option<f64>,
    pub avg_sell_price: Option<f64>,
    pub most_used_venue: Venue,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
}

/// Well-known counter mints, by mint address
const KNOWN_MINTS: &[(&str, &str)] = &[
    ("So11111111111111111111111111111111111111112", "SOL"),
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC"),
    ("Es9vMFrzaCERWk5aZ8c9avH75CA1aE34zRHJfF5uX3bD", "USDT"),
    ("7XSgghYt92nA8AXtLxLqTTCFFuR1EK4gEG7mpyx3zWZp", "JUP"),
];

/// Display symbol for a mint. Unknown mints show as `UNK(<first 4 chars>)`.
pub fn mint_symbol(mint: &str) -> String {
    KNOWN_MINTS
        .iter()
        .find(|(address, _)| *address == mint)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| format!("UNK({})", mint.chars().take(4).collect::<String>()))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `None` when there is nothing to summarise.
///
/// Venue ties go to the venue seen first in `records` order.
pub fn summarize(records: &[TransferRecord]) -> Option<TransferSummary> {
    if records.is_empty() {
        return None;
    }

    let mut buys = 0;
    let mut sells = 0;
    let mut buy_volume = 0.0;
    let mut sell_volume = 0.0;
    let mut buy_prices = Vec::new();
    let mut sell_prices = Vec::new();
    let mut venue_counts: HashMap<Venue, (usize, usize)> = HashMap::new();
    let mut first_timestamp = i64::MAX;
    let mut last_timestamp = i64::MIN;

    for (index, record) in records.iter().enumerate() {
        match record.direction {
            TradeDirection::Buy => {
                buys += 1;
                buy_volume += record.amount;
                buy_prices.extend(record.price);
            }
            TradeDirection::Sell => {
                sells += 1;
                sell_volume += record.amount;
                sell_prices.extend(record.price);
            }
        }

        venue_counts.entry(record.venue).or_insert((0, index)).0 += 1;
        first_timestamp = first_timestamp.min(record.timestamp);
        last_timestamp = last_timestamp.max(record.timestamp);
    }

    let most_used_venue = venue_counts
        .into_iter()
        .max_by(|(_, (count_a, seen_a)), (_, (count_b, seen_b))| {
            count_a.cmp(count_b).then_with(|| seen_b.cmp(seen_a))
        })
        .map(|(venue, _)| venue)
        .unwrap_or(Venue::Unknown);

    Some(TransferSummary {
        total: records.len(),
        buys,
        sells,
        buy_volume,
        sell_volume,
        avg_buy_price: mean(&buy_prices),
        avg_sell_price: mean(&sell_prices),
        most_used_venue,
        first_timestamp,
        last_timestamp,
    })
}
