use crate::pipeline::types::TokenBalance;

/// Change of one owner's balance in one mint across a transaction
#[derive(Debug, Clone)]
pub struct BalanceDelta {
    pub mint: String,
    pub raw_change: i128,
    pub ui_change: f64,
}

impl BalanceDelta {
    pub fn is_inflow(&self) -> bool {
        self.raw_change > 0
    }

    pub fn is_outflow(&self) -> bool {
        self.raw_change < 0
    }

    pub fn abs_ui_change(&self) -> f64 {
        self.ui_change.abs()
    }
}

/// Parse the base-unit amount string of a balance entry
pub fn raw_amount(balance: &TokenBalance) -> Option<u64> {
    balance.ui_token_amount.amount.parse::<u64>().ok()
}

pub fn find_balance<'a>(
    balances: &'a [TokenBalance],
    owner: &str,
    mint: &str,
) -> Option<&'a TokenBalance> {
    balances
        .iter()
        .find(|b| b.owner.as_deref() == Some(owner) && b.mint == mint)
}

/// Delta for (owner, mint). `None` when either snapshot is missing or
/// unparsable; the transaction then did not move this mint for the owner.
pub fn owner_mint_delta(
    pre_balances: &[TokenBalance],
    post_balances: &[TokenBalance],
    owner: &str,
    mint: &str,
) -> Option<BalanceDelta> {
    let pre = find_balance(pre_balances, owner, mint)?;
    let post = find_balance(post_balances, owner, mint)?;

    let pre_raw = raw_amount(pre)?;
    let post_raw = raw_amount(post)?;
    let decimals = post.ui_token_amount.decimals;

    let raw_change = (post_raw as i128) - (pre_raw as i128);
    let ui_change = raw_change as f64 / 10f64.powi(decimals as i32);

    Some(BalanceDelta {
        mint: mint.to_string(),
        raw_change,
        ui_change,
    })
}

/// Deltas of every other mint the owner holds in the post snapshot, in
/// snapshot order. Entries without a matching pre snapshot are skipped.
pub fn counter_mint_deltas(
    pre_balances: &[TokenBalance],
    post_balances: &[TokenBalance],
    owner: &str,
    target_mint: &str,
) -> Vec<BalanceDelta> {
    post_balances
        .iter()
        .filter(|b| b.owner.as_deref() == Some(owner) && b.mint != target_mint)
        .filter_map(|b| owner_mint_delta(pre_balances, post_balances, owner, &b.mint))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use solana_account_decoder_client_types::token::UiTokenAmount;

    pub fn balance(index: u8, owner: &str, mint: &str, raw: u64, decimals: u8) -> TokenBalance {
        let ui = raw as f64 / 10f64.powi(decimals as i32);
        TokenBalance {
            account_index: index,
            mint: mint.to_string(),
            owner: Some(owner.to_string()),
            ui_token_amount: UiTokenAmount {
                ui_amount: Some(ui),
                decimals,
                amount: raw.to_string(),
                ui_amount_string: ui.to_string(),
            },
        }
    }
}
