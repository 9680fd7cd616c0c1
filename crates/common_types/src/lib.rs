use serde::{Deserialize, Serialize};

/// Velocity reported for a bundle whose purchases all share one timestamp.
pub const INSTANT_PURCHASE_VELOCITY: f64 = f64::MAX;

/// One on-chain purchase of the analyzed mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
  pub signature: String,
  pub slot: u64,
  /// Milliseconds since the unix epoch.
  pub timestamp: i64,
  /// SOL paid per token unit.
  pub price: f64,
  pub quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
  /// Raw units.
  pub supply: u64,
  pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
  pub slot: u64,
  /// Signature of the first trade in the slot. A display label only.
  pub bundle_address: String,
  pub transactions: Vec<Trade>,
  pub supply_percentage: f64,
  pub sol_spent: f64,
  pub current_holdings: f64,
  pub avg_price_per_token: f64,
  pub first_purchase_time: i64,
  pub last_purchase_time: i64,
  /// Tokens per hour, or [`INSTANT_PURCHASE_VELOCITY`].
  pub purchase_velocity: f64,
  pub is_pumpfun_bundle: bool,
}

impl Bundle {
  pub fn total_quantity(&self) -> f64 {
    self.transactions.iter().map(|t| t.quantity).sum()
  }

  /// All purchases landed at the same timestamp.
  pub fn is_instantaneous(&self) -> bool {
    self.first_purchase_time == self.last_purchase_time
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousPatterns {
  pub rapid_accumulation: Vec<Bundle>,
  pub price_manipulation: Vec<Bundle>,
  pub coordinated_buying: Vec<Bundle>,
}

impl SuspiciousPatterns {
  pub fn is_empty(&self) -> bool {
    self.rapid_accumulation.is_empty()
      && self.price_manipulation.is_empty()
      && self.coordinated_buying.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintBundleAnalysis {
  pub mint_address: String,
  pub total_bundles: usize,
  pub total_sol_spent: f64,
  /// Distinct transaction signatures across all bundles, not distinct owners.
  pub total_unique_wallets: usize,
  pub total_supply: f64,
  pub largest_bundle: Option<Bundle>,
  pub bundles: Vec<Bundle>,
  pub suspicious_patterns: SuspiciousPatterns,
}

/// Uniform envelope handed to API and UI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<MintBundleAnalysis>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl AnalysisOutcome {
  pub fn ok(data: MintBundleAnalysis) -> Self {
    Self { success: true, data: Some(data), error: None }
  }

  pub fn failed(error: impl Into<String>) -> Self {
    Self { success: false, data: None, error: Some(error.into()) }
  }
}
