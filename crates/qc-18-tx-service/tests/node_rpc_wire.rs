//! # Node JSON-RPC Wire Tests (qc-18)
//!
//! Runs `HttpNodeQuerier` against a one-shot HTTP listener on localhost and
//! checks the JSON-RPC body that reaches the node.
//!
//! ## Test Categories
//!
//! 1. **Method calls** - broadcast and tx lookup are sent as node methods
//! 2. **State queries** - account paths still go through `abci_query`
//! 3. **Node errors** - not-found and mempool reasons survive the RPC error

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use qc_18_tx_service::{
    AccAddress, AccountRetriever, BroadcastMode, BroadcastTxRequest, Code, GetTxRequest,
    HttpNodeQuerier, MockSimulator, NodeAccountRetriever, NodeBroadcaster, NodeConfig,
    NodeTxSearcher, SimulationOutcome, Tx, TxCodec, TxService, TxServiceApi, TxServiceConfig,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

/// Accept one connection, answer it with `answer`, and hand back the request body.
async fn serve_once(answer: Value) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let body_start = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find_header_end(&buf) {
                break end;
            }
        };

        let head = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);

        while buf.len() < body_start + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let body = serde_json::to_vec(&answer).unwrap();
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(&body).await.unwrap();
        stream.shutdown().await.unwrap();

        serde_json::from_slice(&buf[body_start..body_start + content_length]).unwrap()
    });

    (url, handle)
}

fn querier(url: String) -> Arc<HttpNodeQuerier> {
    Arc::new(
        HttpNodeQuerier::new(&NodeConfig {
            rpc_url: url,
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    )
}

type HttpService =
    TxService<NodeTxSearcher<HttpNodeQuerier>, MockSimulator, NodeBroadcaster<HttpNodeQuerier>>;

fn node_service(url: String) -> HttpService {
    TxService::with_node(
        querier(url),
        Arc::new(MockSimulator::succeeding(SimulationOutcome::default())),
        &TxServiceConfig::default(),
    )
    .unwrap()
}

// =============================================================================
// CATEGORY 1: METHOD CALLS
// =============================================================================

#[tokio::test]
async fn test_broadcast_is_sent_as_node_method() {
    let (url, request) = serve_once(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": { "code": 0, "data": "", "log": "[]", "codespace": "", "hash": "C0FFEE" }
    }))
    .await;

    let response = node_service(url)
        .broadcast_tx(Some(BroadcastTxRequest {
            tx_bytes: Some(vec![1, 2, 3]),
            mode: BroadcastMode::Sync,
        }))
        .await
        .unwrap();

    let sent = request.await.unwrap();
    assert_eq!(sent["jsonrpc"], "2.0");
    assert_eq!(sent["method"], "broadcast_tx_sync");
    assert_eq!(sent["params"]["tx"], BASE64_STANDARD.encode([1, 2, 3]));
    assert_eq!(response.tx_response.txhash, "C0FFEE");
    assert_eq!(response.tx_response.code, 0);
}

#[tokio::test]
async fn test_tx_lookup_is_sent_as_node_method() {
    let codec = TxCodec::new();
    let tx = Tx::default();
    let bytes = codec.encode(&tx).unwrap();
    let hash = qc_18_tx_service::tx_hash_of(&bytes);

    let (url, request) = serve_once(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "hash": hash,
            "height": "44",
            "index": 0,
            "tx_result": { "code": 0, "gas_wanted": "200000", "gas_used": "81234" },
            "tx": BASE64_STANDARD.encode(&bytes)
        }
    }))
    .await;

    let found = node_service(url)
        .get_tx(Some(GetTxRequest { hash: hash.clone() }))
        .await
        .unwrap();

    let sent = request.await.unwrap();
    assert_eq!(sent["method"], "tx");
    assert_eq!(
        sent["params"]["hash"],
        BASE64_STANDARD.encode(hex::decode(&hash).unwrap())
    );
    assert_eq!(found.tx, tx);
    assert_eq!(found.tx_response.height, 44);
    assert_eq!(found.tx_response.gas_used, 81_234);
}

// =============================================================================
// CATEGORY 2: STATE QUERIES
// =============================================================================

#[tokio::test]
async fn test_account_query_goes_through_abci_query() {
    let account = json!({
        "address": "cosmos1abc",
        "public_key": null,
        "account_number": 7,
        "sequence": 3
    });
    let (url, request) = serve_once(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "response": {
                "code": 0,
                "log": "",
                "value": BASE64_STANDARD.encode(serde_json::to_vec(&account).unwrap()),
                "height": "90"
            }
        }
    }))
    .await;

    let node = querier(url);
    let (found, height) = NodeAccountRetriever::new()
        .get_account_with_height(node.as_ref(), &AccAddress::new("cosmos1abc"))
        .await
        .unwrap();

    let sent = request.await.unwrap();
    assert_eq!(sent["method"], "abci_query");
    assert_eq!(sent["params"]["path"], "custom/acc/account");
    assert_eq!(found.account_number, 7);
    assert_eq!(height, 90);
}

// =============================================================================
// CATEGORY 3: NODE ERRORS
// =============================================================================

#[tokio::test]
async fn test_node_not_found_error_is_not_found() {
    let hash = "AB".repeat(32);
    let (url, _request) = serve_once(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": {
            "code": -32603,
            "message": "Internal error",
            "data": format!("tx ({}) not found", hash)
        }
    }))
    .await;

    let err = node_service(url)
        .get_tx(Some(GetTxRequest { hash: hash.clone() }))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(Code::NotFound));
    assert_eq!(err.to_string(), format!("tx not found: {}", hash));
}

#[tokio::test]
async fn test_mempool_error_becomes_response() {
    let (url, _request) = serve_once(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": {
            "code": -32603,
            "message": "Internal error",
            "data": "tx already exists in cache"
        }
    }))
    .await;

    let response = node_service(url)
        .broadcast_tx(Some(BroadcastTxRequest {
            tx_bytes: Some(vec![4, 5]),
            mode: BroadcastMode::Async,
        }))
        .await
        .unwrap();

    assert_eq!(response.tx_response.code, 19);
    assert_eq!(response.tx_response.codespace, "sdk");
}
