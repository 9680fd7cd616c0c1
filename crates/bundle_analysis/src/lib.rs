pub mod bundle;
pub mod group;
pub mod patterns;
pub mod report;
pub mod source;
pub mod units;

use common_types::{MintBundleAnalysis, Trade};
use serde::{Deserialize, Serialize};

pub use bundle::{build_bundles, purchase_velocity, DEFAULT_MIN_SLOT_TRANSACTIONS};
pub use group::{group_by_slot, SlotGroups};
pub use patterns::PatternThresholds;
pub use report::aggregate;
pub use source::{analyze_mint_bundles, AnalysisError, MintInfoSource, TradeHistorySource};
pub use units::ToUi;

/// Caller-tunable knobs for a single analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub min_slot_transactions: usize,
    #[serde(default)]
    pub thresholds: PatternThresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_slot_transactions: DEFAULT_MIN_SLOT_TRANSACTIONS,
            thresholds: PatternThresholds::default(),
        }
    }
}

/// Group, build, classify and aggregate already fetched trades.
///
/// Pure and deterministic: the same inputs always give the same report.
pub fn analyze_trades(
    mint_address: &str,
    trades: Vec<Trade>,
    total_supply: f64,
    options: &AnalysisOptions,
) -> MintBundleAnalysis {
    let groups = group_by_slot(trades);
    let bundles = build_bundles(&groups, options.min_slot_transactions, total_supply);
    let patterns = options.thresholds.classify(&bundles);
    aggregate(mint_address, bundles, patterns, total_supply)
}
