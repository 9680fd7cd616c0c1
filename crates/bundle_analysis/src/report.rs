use std::cmp::Ordering;
use std::collections::HashSet;

use common_types::{Bundle, MintBundleAnalysis, SuspiciousPatterns};

/// Assemble the final report. Bundles are ranked by supply share, highest
/// first; equal shares keep ascending slot order.
pub fn aggregate(
    mint_address: &str,
    mut bundles: Vec<Bundle>,
    suspicious_patterns: SuspiciousPatterns,
    total_supply: f64,
) -> MintBundleAnalysis {
    sort_by_supply_share(&mut bundles);

    let total_sol_spent = bundles.iter().map(|b| b.sol_spent).sum();
    let total_unique_wallets = bundles
        .iter()
        .flat_map(|b| b.transactions.iter().map(|t| t.signature.as_str()))
        .collect::<HashSet<_>>()
        .len();

    MintBundleAnalysis {
        mint_address: mint_address.to_string(),
        total_bundles: bundles.len(),
        total_sol_spent,
        total_unique_wallets,
        total_supply,
        largest_bundle: bundles.first().cloned(),
        bundles,
        suspicious_patterns,
    }
}

pub fn sort_by_supply_share(bundles: &mut [Bundle]) {
    bundles.sort_by(|a, b| {
        b.supply_percentage
            .partial_cmp(&a.supply_percentage)
            .unwrap_or(Ordering::Equal)
            .then(a.slot.cmp(&b.slot))
    });
}
