use std::path::Path;

use anyhow::{Context, Result};
use bundle_analysis::{analyze_trades, AnalysisOptions};
use common_types::{MintBundleAnalysis, MintInfo, Trade};
use serde::{Deserialize, Serialize};

/// Captured mint data for offline analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFixture {
    pub mint: String,
    pub supply: u64,
    pub decimals: u8,
    pub trades: Vec<Trade>,
}

impl ReplayFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn mint_info(&self) -> MintInfo {
        MintInfo { supply: self.supply, decimals: self.decimals }
    }

    pub fn analyze(&self, options: &AnalysisOptions) -> MintBundleAnalysis {
        analyze_trades(&self.mint, self.trades.clone(), self.supply as f64, options)
    }
}
