use std::{str::FromStr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bundle_analysis::{
    analyze_mint_bundles, AnalysisError, AnalysisOptions, MintInfoSource, PatternThresholds, ToUi, TradeHistorySource,
};
use common_types::{AnalysisOutcome, MintBundleAnalysis, MintInfo};
use prometheus::{opts, Encoder, IntCounterVec, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{Lookup, SingleFlightCache};

pub type CachedAnalysis = Arc<(MintBundleAnalysis, MintInfo)>;
pub type AnalysisCache = SingleFlightCache<(String, usize), CachedAnalysis, Arc<AnalysisError>>;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    requests: IntCounterVec,
    analyses: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let requests = IntCounterVec::new(opts!("requests_total", "requests"), &["endpoint"])?;
        let analyses = IntCounterVec::new(opts!("analyses_total", "bundle analyses"), &["outcome"])?;
        let registry = Registry::new();
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(analyses.clone()))?;
        Ok(Self { registry: Arc::new(registry), requests, analyses })
    }

    /// Prometheus text exposition of every registered counter.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub mint_source: Arc<dyn MintInfoSource>,
    pub history_source: Arc<dyn TradeHistorySource>,
    pub thresholds: Arc<RwLock<PatternThresholds>>,
    pub cache: Arc<AnalysisCache>,
    pub min_slot_transactions: usize,
    pub fetch_timeout: Duration,
    pub admin_token: Option<String>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        mint_source: Arc<dyn MintInfoSource>,
        history_source: Arc<dyn TradeHistorySource>,
        thresholds: PatternThresholds,
        cache: AnalysisCache,
        min_slot_transactions: usize,
        fetch_timeout: Duration,
        admin_token: Option<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            mint_source,
            history_source,
            thresholds: Arc::new(RwLock::new(thresholds)),
            cache: Arc::new(cache),
            min_slot_transactions,
            fetch_timeout,
            admin_token,
            metrics: Metrics::new()?,
        })
    }

    /// Analyze through the cache; concurrent requests for one mint share a fetch.
    pub async fn analyze(&self, mint: &str, min_slot_transactions: usize) -> Result<CachedAnalysis, Arc<AnalysisError>> {
        let key = (mint.to_string(), min_slot_transactions);
        let state = self.clone();
        let mint = mint.to_string();
        let (result, lookup) = self
            .cache
            .get_or_compute(key, || async move {
                let thresholds = state.thresholds.read().await.clone();
                let options = AnalysisOptions { min_slot_transactions, thresholds };
                analyze_mint_bundles(
                    &mint,
                    state.mint_source.as_ref(),
                    state.history_source.as_ref(),
                    &options,
                    state.fetch_timeout,
                )
                .await
                .map(Arc::new)
                .map_err(Arc::new)
            })
            .await;

        let outcome = match (&result, lookup) {
            (Err(_), _) => "error",
            (Ok(_), Lookup::Hit | Lookup::Joined) => "cached",
            (Ok(_), Lookup::Computed) => "ok",
        };
        self.metrics.analyses.with_label_values(&[outcome]).inc();
        result
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let presented = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match (self.admin_token.as_deref(), presented) {
            (Some(expected), Some(token)) if token == expected => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Analysis(Arc<AnalysisError>),
    #[error("admin token required")]
    Unauthorized,
    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Analysis(e) => match e.as_ref() {
                AnalysisError::InvalidMint(_) => StatusCode::BAD_REQUEST,
                AnalysisError::Timeout(..) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
        };
        (status, Json(AnalysisOutcome::failed(self.to_string()))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/thresholds", get(get_thresholds).put(put_thresholds))
        .route("/v1/bundles/:mint", get(get_bundles))
        .route("/v1/analyze", post(analyze))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    cached_analyses: usize,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health { status: "ok", cached_analyses: state.cache.len().await })
}

async fn get_thresholds(State(state): State<AppState>) -> Json<PatternThresholds> {
    Json(state.thresholds.read().await.clone())
}

/// Replacing thresholds invalidates every cached report, since each was
/// classified under the old ones.
async fn put_thresholds(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(thresholds): Json<PatternThresholds>,
) -> Result<Json<PatternThresholds>, ApiError> {
    state.require_admin(&headers)?;
    *state.thresholds.write().await = thresholds.clone();
    state.cache.clear().await;
    info!(?thresholds, "pattern thresholds replaced");
    Ok(Json(thresholds))
}

#[derive(Deserialize)]
struct BundlesQuery {
    min_slot_transactions: Option<usize>,
    #[serde(default)]
    ui_units: bool,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    mint: String,
    min_slot_transactions: Option<usize>,
    #[serde(default)]
    ui_units: bool,
}

async fn get_bundles(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    Query(q): Query<BundlesQuery>,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    state.metrics.requests.with_label_values(&["bundles"]).inc();
    run_analysis(&state, &mint, q.min_slot_transactions, q.ui_units).await
}

async fn analyze(State(state): State<AppState>, Json(req): Json<AnalyzeRequest>) -> Result<Json<AnalysisOutcome>, ApiError> {
    state.metrics.requests.with_label_values(&["analyze"]).inc();
    run_analysis(&state, &req.mint, req.min_slot_transactions, req.ui_units).await
}

async fn run_analysis(
    state: &AppState,
    mint: &str,
    min_slot_transactions: Option<usize>,
    ui_units: bool,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    Pubkey::from_str(mint).map_err(|_| ApiError::Analysis(Arc::new(AnalysisError::InvalidMint(mint.to_string()))))?;
    let min = min_slot_transactions.unwrap_or(state.min_slot_transactions);
    if min == 0 {
        return Err(ApiError::BadRequest("min_slot_transactions must be at least 1".into()));
    }

    let cached = state.analyze(mint, min).await.map_err(|e| {
        warn!(mint, err = %e, "bundle analysis failed");
        ApiError::Analysis(e)
    })?;
    let (analysis, info) = cached.as_ref();
    let analysis = if ui_units { analysis.to_ui(info.decimals) } else { analysis.clone() };
    Ok(Json(AnalysisOutcome::ok(analysis)))
}

async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state.metrics.render().map_err(ApiError::Internal)
}
