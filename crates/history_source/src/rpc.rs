use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bundle_analysis::MintInfoSource;
use common_types::MintInfo;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;

/// Reads supply and decimals through `getTokenSupply`.
#[derive(Clone)]
pub struct RpcMintInfoSource {
    rpc: Arc<RpcClient>,
}

impl RpcMintInfoSource {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self { rpc: Arc::new(RpcClient::new_with_timeout(rpc_url, timeout)) }
    }

    pub fn from_client(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl MintInfoSource for RpcMintInfoSource {
    async fn fetch_mint_info(&self, mint: &str) -> Result<MintInfo> {
        let mint_pubkey = Pubkey::from_str(mint).with_context(|| format!("bad mint pubkey {mint}"))?;
        let amount = self
            .rpc
            .get_token_supply(&mint_pubkey)
            .await
            .context("getTokenSupply failed")?;
        parse_supply(&amount.amount, amount.decimals)
    }
}

pub(crate) fn parse_supply(amount: &str, decimals: u8) -> Result<MintInfo> {
    let supply = amount.parse::<u64>().with_context(|| format!("unparseable supply {amount:?}"))?;
    Ok(MintInfo { supply, decimals })
}
