use common_types::{Bundle, Trade, INSTANT_PURCHASE_VELOCITY};
use tracing::debug;

use crate::group::SlotGroups;

pub const DEFAULT_MIN_SLOT_TRANSACTIONS: usize = 2;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Build one [`Bundle`] per slot holding at least `min_slot_transactions`
/// trades. Bundles come out in slot order.
pub fn build_bundles(groups: &SlotGroups, min_slot_transactions: usize, total_supply: f64) -> Vec<Bundle> {
    if total_supply <= 0.0 {
        debug!(total_supply, "non-positive supply, supply percentages fall back to zero");
    }
    groups
        .iter()
        .filter(|(_, trades)| !trades.is_empty() && trades.len() >= min_slot_transactions)
        .filter_map(|(slot, trades)| build_bundle(*slot, trades, total_supply))
        .collect()
}

/// Derive bundle metrics for the trades of a single slot.
pub fn build_bundle(slot: u64, trades: &[Trade], total_supply: f64) -> Option<Bundle> {
    let first = trades.first()?;

    let total_quantity: f64 = trades.iter().map(|t| t.quantity).sum();
    let sol_spent: f64 = trades.iter().map(|t| t.price * t.quantity).sum();
    let first_purchase_time = trades.iter().map(|t| t.timestamp).min().unwrap_or(first.timestamp);
    let last_purchase_time = trades.iter().map(|t| t.timestamp).max().unwrap_or(first.timestamp);

    let supply_percentage = if total_supply > 0.0 {
        total_quantity / total_supply * 100.0
    } else {
        0.0
    };
    let avg_price_per_token = if total_quantity > 0.0 { sol_spent / total_quantity } else { 0.0 };

    Some(Bundle {
        slot,
        bundle_address: first.signature.clone(),
        transactions: trades.to_vec(),
        supply_percentage,
        sol_spent,
        current_holdings: total_quantity,
        avg_price_per_token,
        first_purchase_time,
        last_purchase_time,
        purchase_velocity: purchase_velocity(total_quantity, first_purchase_time, last_purchase_time),
        is_pumpfun_bundle: false,
    })
}

/// Tokens per hour between the first and last purchase.
///
/// A zero-length window yields [`INSTANT_PURCHASE_VELOCITY`] when anything was
/// bought, and zero otherwise.
pub fn purchase_velocity(total_quantity: f64, first_ms: i64, last_ms: i64) -> f64 {
    if total_quantity <= 0.0 {
        return 0.0;
    }
    let elapsed_ms = last_ms.saturating_sub(first_ms);
    if elapsed_ms <= 0 {
        return INSTANT_PURCHASE_VELOCITY;
    }
    total_quantity / (elapsed_ms as f64 / MS_PER_HOUR)
}
