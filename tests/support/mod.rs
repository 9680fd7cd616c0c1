#![allow(dead_code)]

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use bundle_analysis::{MintInfoSource, PatternThresholds, TradeHistorySource};
use bundle_inspector::{AppState, SingleFlightCache};
use common_types::{MintInfo, Trade};

pub const MINT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";
pub const ADMIN: &str = "s3cret";

pub struct MockMint {
    pub info: Option<MintInfo>,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl MockMint {
    pub fn ok(supply: u64, decimals: u8) -> Self {
        Self { info: Some(MintInfo { supply, decimals }), calls: AtomicUsize::new(0), delay: Duration::ZERO }
    }

    pub fn failing() -> Self {
        Self { info: None, calls: AtomicUsize::new(0), delay: Duration::ZERO }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MintInfoSource for MockMint {
    async fn fetch_mint_info(&self, _mint: &str) -> anyhow::Result<MintInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.info.ok_or_else(|| anyhow!("mint account not found"))
    }
}

pub struct MockHistory {
    pub trades: Vec<Trade>,
    pub calls: AtomicUsize,
}

impl MockHistory {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self { trades, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeHistorySource for MockHistory {
    async fn fetch_trades(&self, _mint: &str) -> anyhow::Result<Vec<Trade>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.trades.clone())
    }
}

/// Two bundles: slot 10 holds 8.2% of supply, slot 20 holds 3.1%, slot 30 is a lone buy.
pub fn sample_trades() -> Vec<Trade> {
    let mut trades = Vec::new();
    for (i, q) in [40_000.0, 42_000.0].into_iter().enumerate() {
        trades.push(Trade { signature: format!("big{i}"), slot: 10, timestamp: 1_000, price: 0.001, quantity: q });
    }
    for (i, q) in [11_000.0, 20_000.0].into_iter().enumerate() {
        trades.push(Trade { signature: format!("small{i}"), slot: 20, timestamp: 2_000 + i as i64 * 60_000, price: 0.002, quantity: q });
    }
    trades.push(Trade { signature: "lone".into(), slot: 30, timestamp: 9_000, price: 0.003, quantity: 5.0 });
    trades
}

pub fn state(mint: Arc<MockMint>, history: Arc<MockHistory>) -> AppState {
    AppState::new(
        mint,
        history,
        PatternThresholds::default(),
        SingleFlightCache::new(Duration::from_secs(300), NonZeroUsize::new(64).unwrap()),
        2,
        Duration::from_secs(2),
        Some(ADMIN.to_string()),
    )
    .unwrap()
}
