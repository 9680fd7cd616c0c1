use std::{fs, io::ErrorKind, num::NonZeroUsize, path::Path, time::Duration};

use anyhow::{Context, Result};
use bundle_analysis::{PatternThresholds, DEFAULT_MIN_SLOT_TRANSACTIONS};
use history_source::{HeliusConfig, HeliusTradeSource, RpcMintInfoSource};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InspectorConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_helius_base_url")]
    pub helius_base_url: String,
    #[serde(default)]
    pub helius_api_key: Option<String>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_history_page_limit")]
    pub history_page_limit: usize,
    #[serde(default = "default_history_max_pages")]
    pub history_max_pages: usize,
    #[serde(default = "default_min_slot_transactions")]
    pub min_slot_transactions: usize,
    #[serde(default)]
    pub thresholds: PatternThresholds,
}

fn default_rpc_url() -> String { "https://api.mainnet-beta.solana.com".into() }
fn default_helius_base_url() -> String { "https://api.helius.xyz".into() }
fn default_bind_addr() -> String { "0.0.0.0:8080".into() }
fn default_cache_ttl_secs() -> u64 { 300 }
fn default_cache_capacity() -> usize { 1024 }
fn default_fetch_timeout_secs() -> u64 { 10 }
fn default_history_page_limit() -> usize { 100 }
fn default_history_max_pages() -> usize { 10 }
fn default_min_slot_transactions() -> usize { DEFAULT_MIN_SLOT_TRANSACTIONS }

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            helius_base_url: default_helius_base_url(),
            helius_api_key: None,
            bind_addr: default_bind_addr(),
            admin_token: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            history_page_limit: default_history_page_limit(),
            history_max_pages: default_history_max_pages(),
            min_slot_transactions: default_min_slot_transactions(),
            thresholds: PatternThresholds::default(),
        }
    }
}

impl InspectorConfig {
    /// Read a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(data) => toml::from_str(&data).with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Load and apply overrides from the process environment.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Ok(Self::load(path)?.with_env(|k| std::env::var(k).ok()))
    }

    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("RPC_URL") { self.rpc_url = v; }
        if let Some(v) = var("HELIUS_BASE_URL") { self.helius_base_url = v; }
        if let Some(v) = var("HELIUS_API_KEY") { self.helius_api_key = Some(v); }
        if let Some(v) = var("BIND_ADDR") { self.bind_addr = v; }
        if let Some(v) = var("ADMIN_TOKEN") { self.admin_token = Some(v); }
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn mint_source(&self) -> RpcMintInfoSource {
        RpcMintInfoSource::new(self.rpc_url.clone(), self.fetch_timeout())
    }

    pub fn history_source(&self) -> Result<HeliusTradeSource> {
        let api_key = self.helius_api_key.clone().context("HELIUS_API_KEY not set")?;
        HeliusTradeSource::new(HeliusConfig {
            base_url: self.helius_base_url.clone(),
            api_key,
            page_limit: self.history_page_limit.max(1),
            max_pages: self.history_max_pages,
            timeout: self.fetch_timeout(),
        })
    }
}
