use common_types::{Bundle, SuspiciousPatterns};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds controlling how bundles are sorted into [`SuspiciousPatterns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternThresholds {
    /// Tokens per hour above which a bundle counts as rapid accumulation.
    #[serde(default = "default_rapid_velocity_per_hour")]
    pub rapid_velocity_per_hour: f64,
    /// Max/min price ratio inside a bundle above which it counts as manipulation.
    #[serde(default = "default_price_ratio")]
    pub price_ratio: f64,
    #[serde(default = "default_coordinated_min_transactions")]
    pub coordinated_min_transactions: usize,
    #[serde(default = "default_coordinated_min_supply_pct")]
    pub coordinated_min_supply_pct: f64,
}

fn default_rapid_velocity_per_hour() -> f64 { 1000.0 }
fn default_price_ratio() -> f64 { 2.0 }
fn default_coordinated_min_transactions() -> usize { 5 }
fn default_coordinated_min_supply_pct() -> f64 { 5.0 }

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            rapid_velocity_per_hour: default_rapid_velocity_per_hour(),
            price_ratio: default_price_ratio(),
            coordinated_min_transactions: default_coordinated_min_transactions(),
            coordinated_min_supply_pct: default_coordinated_min_supply_pct(),
        }
    }
}

impl PatternThresholds {
    pub fn is_rapid_accumulation(&self, bundle: &Bundle) -> bool {
        bundle.purchase_velocity > self.rapid_velocity_per_hour
    }

    /// Prices must all be finite and strictly positive for the ratio to mean
    /// anything; otherwise the bundle is not flagged.
    pub fn is_price_manipulation(&self, bundle: &Bundle) -> bool {
        match price_spread(bundle) {
            Some(ratio) => ratio > self.price_ratio,
            None => false,
        }
    }

    pub fn is_coordinated_buying(&self, bundle: &Bundle) -> bool {
        bundle.transactions.len() >= self.coordinated_min_transactions
            && bundle.supply_percentage > self.coordinated_min_supply_pct
    }

    /// Run every filter independently; a bundle may land in any number of lists.
    pub fn classify(&self, bundles: &[Bundle]) -> SuspiciousPatterns {
        let mut patterns = SuspiciousPatterns::default();
        for bundle in bundles {
            if self.is_rapid_accumulation(bundle) {
                patterns.rapid_accumulation.push(bundle.clone());
            }
            if self.is_price_manipulation(bundle) {
                patterns.price_manipulation.push(bundle.clone());
            }
            if self.is_coordinated_buying(bundle) {
                patterns.coordinated_buying.push(bundle.clone());
            }
        }
        patterns
    }
}

/// `max(price) / min(price)` over the bundle's trades, if well defined.
pub fn price_spread(bundle: &Bundle) -> Option<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for trade in &bundle.transactions {
        if !trade.price.is_finite() {
            debug!(slot = bundle.slot, signature = %trade.signature, "non-finite price, skipping spread");
            return None;
        }
        min = min.min(trade.price);
        max = max.max(trade.price);
    }
    if bundle.transactions.is_empty() {
        return None;
    }
    if min <= 0.0 {
        debug!(slot = bundle.slot, "non-positive minimum price, skipping spread");
        return None;
    }
    Some(max / min)
}
