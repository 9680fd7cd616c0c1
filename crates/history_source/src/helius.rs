use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bundle_analysis::TradeHistorySource;
use common_types::Trade;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

#[derive(Clone, Debug)]
pub struct HeliusConfig {
    pub base_url: String,
    pub api_key: String,
    pub page_limit: usize,
    pub max_pages: usize,
    pub timeout: Duration,
}

/// Purchase history from the Helius enhanced transactions API.
#[derive(Clone)]
pub struct HeliusTradeSource {
    client: Client,
    cfg: HeliusConfig,
}

impl HeliusTradeSource {
    pub fn new(cfg: HeliusConfig) -> Result<Self> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { client, cfg })
    }

    async fn fetch_page(&self, mint: &str, before: Option<&str>) -> Result<Vec<EnhancedTx>> {
        let url = format!("{}/v0/addresses/{}/transactions", self.cfg.base_url.trim_end_matches('/'), mint);
        let limit = self.cfg.page_limit.to_string();
        let mut query = vec![("api-key", self.cfg.api_key.as_str()), ("type", "SWAP"), ("limit", limit.as_str())];
        if let Some(sig) = before {
            query.push(("before", sig));
        }
        let resp = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .context("helius request failed")?
            .error_for_status()
            .context("helius returned error status")?;
        resp.json::<Vec<EnhancedTx>>().await.context("helius response not understood")
    }
}

#[async_trait]
impl TradeHistorySource for HeliusTradeSource {
    async fn fetch_trades(&self, mint: &str) -> Result<Vec<Trade>> {
        let mut trades = Vec::new();
        let mut before: Option<String> = None;
        for page in 0..self.cfg.max_pages.max(1) {
            let txs = self.fetch_page(mint, before.as_deref()).await?;
            let fetched = txs.len();
            before = txs.last().map(|t| t.signature.clone());
            trades.extend(txs.iter().filter_map(|tx| purchase_of(tx, mint)));
            debug!(page, fetched, total = trades.len(), "helius page");
            if fetched < self.cfg.page_limit || before.is_none() {
                return Ok(trades);
            }
        }
        warn!(mint, max_pages = self.cfg.max_pages, "history truncated at page limit");
        Ok(trades)
    }

    fn max_calls(&self) -> u32 {
        u32::try_from(self.cfg.max_pages.max(1)).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnhancedTx {
    signature: String,
    slot: u64,
    /// Block time in seconds.
    timestamp: i64,
    #[serde(default)]
    events: Events,
}

#[derive(Debug, Default, Deserialize)]
struct Events {
    swap: Option<SwapEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapEvent {
    native_input: Option<NativeAmount>,
    #[serde(default)]
    token_outputs: Vec<TokenAmount>,
}

#[derive(Debug, Deserialize)]
struct NativeAmount {
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmount {
    mint: String,
    raw_token_amount: RawTokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenAmount {
    token_amount: String,
}

/// A swap is a purchase of `mint` when SOL goes in and `mint` comes out.
/// Quantities stay in raw units; price is SOL per raw unit.
pub(crate) fn purchase_of(tx: &EnhancedTx, mint: &str) -> Option<Trade> {
    let swap = tx.events.swap.as_ref()?;
    let lamports: f64 = swap.native_input.as_ref()?.amount.parse().ok()?;
    if !lamports.is_finite() || lamports < 0.0 {
        return None;
    }
    let quantity: f64 = swap
        .token_outputs
        .iter()
        .filter(|o| o.mint == mint)
        .filter_map(|o| o.raw_token_amount.token_amount.parse::<f64>().ok())
        .sum();
    if !(quantity.is_finite() && quantity > 0.0) {
        return None;
    }
    Some(Trade {
        signature: tx.signature.clone(),
        slot: tx.slot,
        timestamp: tx.timestamp.saturating_mul(1000),
        price: lamports / LAMPORTS_PER_SOL / quantity,
        quantity,
    })
}
