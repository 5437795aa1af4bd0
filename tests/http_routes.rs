//! Public routes: path handling, JSON-RPC errors and health views.

use serde_json::Value;
use std::time::Duration;

mod common;
use common::{chain, test_config, wait_until, MockUpstream, TestProxy};

const SETTLE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_block_number_is_stored_in_decimal() {
    let a = MockUpstream::start("alpha").await;
    a.set_block(0x10);
    let config = test_config(vec![chain("ethereum", 1, vec![a.endpoint(1)])]);
    let proxy = TestProxy::start(config).await;
    assert!(wait_until(SETTLE, || proxy.is_healthy("ethereum", "alpha")).await);

    let snapshot = proxy.registry.snapshot("ethereum").unwrap();
    assert_eq!(snapshot.healthy_endpoints[0].block_number.as_deref(), Some("16"));

    let res = proxy.client.get(proxy.url("/health/ethereum")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["proxy"], "healthy");
    assert_eq!(body["chain"], "ethereum");
    assert_eq!(body["currentRPC"], a.url.as_str());
    assert_eq!(body["rpcEndpoints"][0]["blockNumber"], "16");

    proxy.stop().await;
}

#[tokio::test]
async fn test_legacy_routes_use_default_chain() {
    let a = MockUpstream::start("alpha").await;
    let config = test_config(vec![chain("ethereum", 1, vec![a.endpoint(1)])]);
    let proxy = TestProxy::start(config).await;
    assert!(wait_until(SETTLE, || proxy.is_healthy("ethereum", "alpha")).await);

    for path in ["/", "/rpc"] {
        let body = proxy.rpc(path, "eth_chainId").await;
        assert_eq!(body["result"], "alpha");
    }

    proxy.stop().await;
}

#[tokio::test]
async fn test_rpc_path_alias_resolves_to_chain() {
    let a = MockUpstream::start("alpha").await;
    let mut soneium = chain("soneium-testnet", 1946, vec![a.endpoint(1)]);
    soneium.chain.rpc_path = "minato".into();
    let proxy = TestProxy::start(test_config(vec![soneium])).await;
    assert!(wait_until(SETTLE, || proxy.is_healthy("soneium-testnet", "alpha")).await);

    let body = proxy.rpc("/rpc/minato", "eth_chainId").await;
    assert_eq!(body["result"], "alpha");
    let body = proxy.rpc("/rpc/soneium-testnet", "eth_chainId").await;
    assert_eq!(body["result"], "alpha");

    proxy.stop().await;
}

#[tokio::test]
async fn test_malformed_requests_get_jsonrpc_errors() {
    let proxy = TestProxy::start(test_config(vec![chain("ethereum", 1, vec![])])).await;

    let res = proxy
        .client
        .post(proxy.url("/rpc/ethereum"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["error"]["message"], "Parse error");
    assert_eq!(body["id"], Value::Null);

    let body = proxy.rpc("/rpc/bad%20chain", "eth_chainId").await;
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(
        body["error"]["message"],
        "Invalid request path. Use /rpc/{chainName}"
    );

    let body = proxy.rpc("/rpc/unknown", "eth_chainId").await;
    assert_eq!(body["error"]["code"], -32000);
    assert_eq!(
        body["error"]["message"],
        "No healthy RPC endpoints available for chain: unknown"
    );

    proxy.stop().await;
}

#[tokio::test]
async fn test_health_status_codes() {
    let a = MockUpstream::start("alpha").await;
    let proxy = TestProxy::start(test_config(vec![
        chain("ethereum", 1, vec![a.endpoint(1)]),
        chain(
            "sepolia",
            11155111,
            vec![chain_rpc_proxy::EndpointConfig::new("dead", "http://127.0.0.1:9/")],
        ),
    ]))
    .await;
    assert!(wait_until(SETTLE, || proxy.is_healthy("ethereum", "alpha")).await);

    let res = proxy.client.get(proxy.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["proxy"], "healthy");
    assert_eq!(body["totalChains"], 2);
    assert_eq!(body["healthyChains"], 1);
    assert!(body["chains"]["sepolia"].is_object());

    let res = proxy.client.get(proxy.url("/health/sepolia")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["proxy"], "unhealthy");
    assert_eq!(body["currentRPC"], Value::Null);

    let res = proxy.client.get(proxy.url("/health/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "Chain nowhere not found");

    a.set_healthy(false);
    assert!(wait_until(SETTLE, || !proxy.is_healthy("ethereum", "alpha")).await);
    let res = proxy.client.get(proxy.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 503);

    proxy.stop().await;
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let proxy = TestProxy::start(test_config(vec![chain("ethereum", 1, vec![])])).await;

    let res = proxy.client.get(proxy.url("/health")).send().await.unwrap();
    assert!(res.headers().get("x-request-id").is_some());

    let res = proxy
        .client
        .get(proxy.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    proxy.stop().await;
}
