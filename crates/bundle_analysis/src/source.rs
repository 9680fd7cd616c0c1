use std::{future::Future, time::Duration};

use async_trait::async_trait;
use common_types::{MintBundleAnalysis, MintInfo, Trade};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::{analyze_trades, AnalysisOptions};

/// Supplies total supply and decimals for a mint.
#[async_trait]
pub trait MintInfoSource: Send + Sync {
    async fn fetch_mint_info(&self, mint: &str) -> anyhow::Result<MintInfo>;
}

/// Supplies purchase history for a mint, in any order.
#[async_trait]
pub trait TradeHistorySource: Send + Sync {
    async fn fetch_trades(&self, mint: &str) -> anyhow::Result<Vec<Trade>>;

    /// Most sequential outbound calls one `fetch_trades` may make. The fetch
    /// timeout applies per call, so the whole fetch gets this many of them.
    fn max_calls(&self) -> u32 {
        1
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid mint address: {0}")]
    InvalidMint(String),
    #[error("mint info unavailable: {0:#}")]
    MintInfo(anyhow::Error),
    #[error("trade history unavailable: {0:#}")]
    History(anyhow::Error),
    #[error("{0} fetch timed out after {1:?}")]
    Timeout(&'static str, Duration),
    #[error("no trades found for mint")]
    NoTransactions,
}

impl AnalysisError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalysisError::Timeout(..))
    }
}

async fn with_timeout<T, F>(what: &'static str, limit: Duration, fut: F) -> Result<anyhow::Result<T>, AnalysisError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AnalysisError::Timeout(what, limit))
}

/// Fetch mint info and trade history concurrently, then run the analysis.
///
/// Either fetch failing aborts the whole analysis; there is no partial report.
#[instrument(skip(mint_source, history_source, options), fields(min_slot_transactions = options.min_slot_transactions))]
pub async fn analyze_mint_bundles(
    mint: &str,
    mint_source: &dyn MintInfoSource,
    history_source: &dyn TradeHistorySource,
    options: &AnalysisOptions,
    fetch_timeout: Duration,
) -> Result<(MintBundleAnalysis, MintInfo), AnalysisError> {
    let history_timeout = fetch_timeout.saturating_mul(history_source.max_calls().max(1));
    let (info, trades) = tokio::join!(
        with_timeout("mint info", fetch_timeout, mint_source.fetch_mint_info(mint)),
        with_timeout("trade history", history_timeout, history_source.fetch_trades(mint)),
    );
    let info = info?.map_err(AnalysisError::MintInfo)?;
    let trades = trades?.map_err(AnalysisError::History)?;
    if trades.is_empty() {
        return Err(AnalysisError::NoTransactions);
    }
    debug!(trades = trades.len(), supply = info.supply, decimals = info.decimals, "fetched mint data");

    let analysis = analyze_trades(mint, trades, info.supply as f64, options);
    info!(bundles = analysis.total_bundles, sol = analysis.total_sol_spent, "bundle analysis complete");
    Ok((analysis, info))
}
