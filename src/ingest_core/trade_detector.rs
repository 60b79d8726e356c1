use crate::ingest_core::balance_extractor::{counter_mint_deltas, owner_mint_delta};
use crate::ingest_core::venue::VenueRegistry;
use crate::pipeline::types::{TradeDirection, TransactionDetail, TransferRecord};

const DEFAULT_PRICE_DECIMALS: u32 = 6;

/// Turns pre/post token balance snapshots into buy/sell records.
///
/// Uses ONLY balance deltas (no instruction decoding). Venue attribution is
/// delegated to the `VenueRegistry` and is best-effort.
#[derive(Debug, Clone)]
pub struct TransferClassifier {
    venues: VenueRegistry,
    price_decimals: u32,
}

impl TransferClassifier {
    pub fn new(venues: VenueRegistry) -> Self {
        Self {
            venues,
            price_decimals: DEFAULT_PRICE_DECIMALS,
        }
    }

    pub fn with_price_decimals(mut self, decimals: u32) -> Self {
        self.price_decimals = decimals;
        self
    }

    /// Classify one transaction for (wallet, target mint).
    ///
    /// # Logic
    ///
    /// 1. Locate pre and post balances of the target mint owned by the wallet;
    ///    skip when either is absent
    /// 2. Skip zero deltas; positive delta is a BUY, negative a SELL
    /// 3. Price = counter-asset amount / target amount, using the first other
    ///    mint of the wallet whose balance actually moved
    /// 4. Venue from invoked program ids
    ///
    /// # Returns
    ///
    /// - `None` if the transaction does not move the target mint for the wallet
    pub fn classify(
        &self,
        detail: &TransactionDetail,
        wallet: &str,
        target_mint: &str,
    ) -> Option<TransferRecord> {
        let delta = owner_mint_delta(
            &detail.pre_token_balances,
            &detail.post_token_balances,
            wallet,
            target_mint,
        )?;

        if delta.raw_change == 0 {
            log::debug!("Zero delta for {} in {}, skipping", wallet, detail.signature);
            return None;
        }

        let direction = if delta.is_inflow() {
            TradeDirection::Buy
        } else {
            TradeDirection::Sell
        };
        let amount = delta.abs_ui_change();

        let counter = counter_mint_deltas(
            &detail.pre_token_balances,
            &detail.post_token_balances,
            wallet,
            target_mint,
        )
        .into_iter()
        .find(|d| d.raw_change != 0);

        let (price, counter_mint) = match counter {
            Some(other) if other.abs_ui_change() > 0.0 => (
                Some(self.round_price(other.abs_ui_change() / amount)),
                Some(other.mint),
            ),
            _ => (None, None),
        };

        let venue = self.venues.attribute(&detail.program_ids);

        log::debug!(
            "{} {} by {} | price: {} | via {} | tx: {}",
            direction.as_str(),
            amount,
            wallet,
            price.map(|p| p.to_string()).unwrap_or_else(|| "N/A".to_string()),
            venue,
            detail.signature
        );

        Some(TransferRecord {
            signature: detail.signature.clone(),
            wallet: wallet.to_string(),
            amount,
            direction,
            price,
            venue,
            counter_mint,
            timestamp: detail.block_time.unwrap_or(0),
        })
    }

    fn round_price(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.price_decimals as i32);
        (value * scale).round() / scale
    }
}

impl Default for TransferClassifier {
    fn default() -> Self {
        Self::new(VenueRegistry::default())
    }
}
