mod support;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use bundle_inspector::{router, AppState};
use serde_json::Value;
use support::*;

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn health() {
    let addr = serve(state(Arc::new(MockMint::ok(1, 0)), Arc::new(MockHistory::new(vec![])))).await;
    let body: Value = reqwest::get(format!("http://{addr}/v1/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cachedAnalyses"], 0);
}

#[tokio::test]
async fn bundles_endpoint_returns_ranked_report() {
    let addr = serve(state(Arc::new(MockMint::ok(1_000_000, 0)), Arc::new(MockHistory::new(sample_trades())))).await;
    let resp = reqwest::get(format!("http://{addr}/v1/bundles/{MINT}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["mintAddress"], MINT);
    assert_eq!(data["totalBundles"], 2);
    assert_eq!(data["largestBundle"]["slot"], 10);
    assert_eq!(data["bundles"][0]["slot"], 10);
    assert_eq!(data["bundles"][0]["isPumpfunBundle"], false);
}

#[tokio::test]
async fn analyze_post_with_ui_units() {
    let addr = serve(state(Arc::new(MockMint::ok(1_000_000, 3)), Arc::new(MockHistory::new(sample_trades())))).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/analyze"))
        .json(&serde_json::json!({ "mint": MINT, "min_slot_transactions": 1, "ui_units": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalBundles"], 3);
    assert_eq!(body["data"]["totalSupply"].as_f64(), Some(1_000.0));
}

#[tokio::test]
async fn invalid_mint_is_bad_request() {
    let addr = serve(state(Arc::new(MockMint::ok(1, 0)), Arc::new(MockHistory::new(sample_trades())))).await;
    let resp = reqwest::get(format!("http://{addr}/v1/bundles/not-a-mint")).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn upstream_failure_is_structured() {
    let addr = serve(state(Arc::new(MockMint::failing()), Arc::new(MockHistory::new(sample_trades())))).await;
    let resp = reqwest::get(format!("http://{addr}/v1/bundles/{MINT}")).await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("mint info unavailable"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn zero_threshold_rejected() {
    let addr = serve(state(Arc::new(MockMint::ok(1, 0)), Arc::new(MockHistory::new(sample_trades())))).await;
    let resp = reqwest::get(format!("http://{addr}/v1/bundles/{MINT}?min_slot_transactions=0")).await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn thresholds_require_admin_and_reset_cache() {
    let mint = Arc::new(MockMint::ok(1_000_000, 0));
    let state = state(mint.clone(), Arc::new(MockHistory::new(sample_trades())));
    let addr = serve(state.clone()).await;
    let client = reqwest::Client::new();

    client.get(format!("http://{addr}/v1/bundles/{MINT}")).send().await.unwrap();
    assert_eq!(mint.calls(), 1);

    let update = serde_json::json!({ "coordinated_min_transactions": 2, "coordinated_min_supply_pct": 1.0 });
    let denied = client.put(format!("http://{addr}/v1/thresholds")).json(&update).send().await.unwrap();
    assert_eq!(denied.status(), 401);
    let body: Value = denied.json().await.unwrap();
    assert_eq!(body["success"], false);
    let wrong = client
        .put(format!("http://{addr}/v1/thresholds"))
        .bearer_auth("guess")
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let ok = client
        .put(format!("http://{addr}/v1/thresholds"))
        .bearer_auth(ADMIN)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let current: Value = client.get(format!("http://{addr}/v1/thresholds")).send().await.unwrap().json().await.unwrap();
    assert_eq!(current["coordinated_min_transactions"], 2);
    assert_eq!(current["price_ratio"], 2.0);

    let body: Value = client.get(format!("http://{addr}/v1/bundles/{MINT}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(mint.calls(), 2);
    assert_eq!(body["data"]["suspiciousPatterns"]["coordinatedBuying"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn metrics_count_requests() {
    let addr = serve(state(Arc::new(MockMint::ok(1_000_000, 0)), Arc::new(MockHistory::new(sample_trades())))).await;
    reqwest::get(format!("http://{addr}/v1/bundles/{MINT}")).await.unwrap();
    reqwest::get(format!("http://{addr}/v1/bundles/{MINT}")).await.unwrap();
    let text = reqwest::get(format!("http://{addr}/metrics")).await.unwrap().text().await.unwrap();
    assert!(text.contains("requests_total{endpoint=\"bundles\"} 2"));
    assert!(text.contains("analyses_total{outcome=\"cached\"} 1"));
    assert!(text.contains("analyses_total{outcome=\"ok\"} 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_count_as_cached() {
    let mut mint = MockMint::ok(1_000_000, 0);
    mint.delay = Duration::from_millis(150);
    let mint = Arc::new(mint);
    let addr = serve(state(mint.clone(), Arc::new(MockHistory::new(sample_trades())))).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        tasks.push(tokio::spawn(async move {
            reqwest::get(format!("http://{addr}/v1/bundles/{MINT}")).await.unwrap().status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), 200);
    }
    assert_eq!(mint.calls(), 1);

    let text = reqwest::get(format!("http://{addr}/metrics")).await.unwrap().text().await.unwrap();
    assert!(text.contains("analyses_total{outcome=\"ok\"} 1"));
    assert!(text.contains("analyses_total{outcome=\"cached\"} 7"));
    let health: Value = reqwest::get(format!("http://{addr}/v1/health")).await.unwrap().json().await.unwrap();
    assert_eq!(health["cachedAnalyses"], 1);
}
